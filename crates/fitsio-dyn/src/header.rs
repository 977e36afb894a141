//! FITS header cards: parsing, formatting and keyword lookup/update.

use std::str;

use crate::block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE, HEADER_PAD_BYTE};
use crate::error::{Error, Result};
use crate::value::{escaped_len, format_value, parse_value, value_text, Value};

// ── Types ──

/// A parsed FITS header card (one 80-byte keyword record).
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// The 8-byte keyword name, ASCII, left-justified, space-padded.
    pub keyword: [u8; 8],
    /// The parsed value, if this card has a value indicator (`= ` in bytes 8..10).
    pub value: Option<Value>,
    /// An optional comment string.
    pub comment: Option<String>,
}

impl Card {
    /// Build a value card.
    pub fn new(name: &str, value: Value, comment: Option<&str>) -> Result<Self> {
        Ok(Card {
            keyword: make_keyword(name)?,
            value: Some(value),
            comment: comment.map(String::from),
        })
    }

    /// Return the keyword as a trimmed UTF-8 string.
    pub fn keyword_str(&self) -> &str {
        let end = self
            .keyword
            .iter()
            .rposition(|&b| b != b' ')
            .map(|i| i + 1)
            .unwrap_or(0);
        str::from_utf8(&self.keyword[..end]).unwrap_or("")
    }

    /// Returns `true` if this card is the END keyword.
    pub fn is_end(&self) -> bool {
        &self.keyword == b"END     "
    }

    /// Returns `true` if this card continues a long string value.
    pub fn is_continue(&self) -> bool {
        &self.keyword == KW_CONTINUE
    }

    /// Returns `true` if this card carries a commentary keyword
    /// (COMMENT, HISTORY, or blank).
    pub fn is_commentary(&self) -> bool {
        is_commentary_keyword(&self.keyword)
    }
}

const KW_CONTINUE: &[u8; 8] = b"CONTINUE";

/// Keywords that never carry a value indicator.
const COMMENTARY_KEYWORDS: [&[u8; 8]; 3] = [b"COMMENT ", b"HISTORY ", b"        "];

fn is_commentary_keyword(keyword: &[u8; 8]) -> bool {
    COMMENTARY_KEYWORDS.contains(&keyword)
}

/// Validate and pad a keyword name to 8 bytes.
///
/// Lower-case letters are folded to upper case, as FITS keywords are
/// case-insensitive on lookup.
pub fn make_keyword(name: &str) -> Result<[u8; 8]> {
    let name = name.trim_end();
    if name.len() > 8 {
        return Err(Error::InvalidKeyword);
    }
    let mut k = [b' '; 8];
    for (slot, b) in k.iter_mut().zip(name.bytes()) {
        let b = b.to_ascii_uppercase();
        match b {
            b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => *slot = b,
            _ => return Err(Error::InvalidKeyword),
        }
    }
    Ok(k)
}

// ── Parsing ──

/// Parse a single 80-byte FITS header card.
pub fn parse_card(card_bytes: &[u8; CARD_SIZE]) -> Result<Card> {
    let mut keyword = [b' '; 8];
    keyword.copy_from_slice(&card_bytes[..8]);

    for &b in &keyword {
        match b {
            b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_' => {}
            _ => return Err(Error::InvalidKeyword),
        }
    }

    if &keyword == b"END     " {
        return Ok(Card {
            keyword,
            value: None,
            comment: None,
        });
    }

    let has_value = !is_commentary_keyword(&keyword)
        && (&keyword == KW_CONTINUE || (card_bytes[8] == b'=' && card_bytes[9] == b' '));
    let value_field = &card_bytes[10..CARD_SIZE];

    if has_value {
        if let Some((val, comment)) = parse_value(value_field) {
            return Ok(Card {
                keyword,
                value: Some(val),
                comment: comment.map(String::from),
            });
        }
        if &keyword != KW_CONTINUE && value_text(value_field).is_empty() {
            let field_str = str::from_utf8(value_field)
                .map_err(|_| Error::InvalidHeader("non-ASCII card text"))?;
            return Ok(Card {
                keyword,
                value: Some(Value::Undefined),
                comment: extract_comment_from_empty_value(field_str),
            });
        }
    }

    // Commentary cards, and value cards we cannot parse, keep their text.
    let text = str::from_utf8(&card_bytes[8..])
        .map_err(|_| Error::InvalidHeader("non-ASCII card text"))?
        .trim_end();
    Ok(Card {
        keyword,
        value: None,
        comment: (!text.is_empty()).then(|| String::from(text)),
    })
}

fn extract_comment_from_empty_value(field: &str) -> Option<String> {
    let idx = field.find('/')?;
    let comment = field[idx + 1..].trim();
    (!comment.is_empty()).then(|| String::from(comment))
}

/// Parse consecutive 2880-byte header blocks until the END card is found.
///
/// The END card itself is not included in the result.
pub fn parse_header_blocks(data: &[u8]) -> Result<Vec<Card>> {
    if data.len() < BLOCK_SIZE {
        return Err(Error::UnexpectedEof);
    }

    let mut cards = Vec::new();
    for chunk in data.chunks_exact(CARD_SIZE) {
        let card_bytes: &[u8; CARD_SIZE] = chunk
            .try_into()
            .map_err(|_| Error::InvalidHeader("short card"))?;
        let card = parse_card(card_bytes)?;
        if card.is_end() {
            return Ok(cards);
        }
        cards.push(card);
    }

    Err(Error::InvalidHeader("missing END card"))
}

/// Return the number of bytes consumed by the header (always a multiple of BLOCK_SIZE).
pub fn header_byte_len(data: &[u8]) -> Result<usize> {
    let num_blocks = data.len() / BLOCK_SIZE;
    if num_blocks == 0 {
        return Err(Error::UnexpectedEof);
    }

    for block_idx in 0..num_blocks {
        let block_start = block_idx * BLOCK_SIZE;
        for card_idx in 0..CARDS_PER_BLOCK {
            let card_start = block_start + card_idx * CARD_SIZE;
            if &data[card_start..card_start + 8] == b"END     " {
                return Ok((block_idx + 1) * BLOCK_SIZE);
            }
        }
    }

    Err(Error::InvalidHeader("missing END card"))
}

// ── Writing ──

/// Serialize a [`Card`] into an 80-byte FITS card image.
pub fn format_card(card: &Card) -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..8].copy_from_slice(&card.keyword);

    match card.value {
        Some(ref value) => {
            if !card.is_continue() {
                buf[8] = b'=';
            }
            let mut field = format_value(value);
            if let Some(ref comment) = card.comment {
                insert_comment(&mut field, comment);
            }
            buf[10..80].copy_from_slice(&field);
        }
        None => {
            if let Some(ref comment) = card.comment {
                let bytes = comment.as_bytes();
                let len = bytes.len().min(72);
                buf[8..8 + len].copy_from_slice(&bytes[..len]);
            }
        }
    }

    buf
}

/// Insert a ` / comment` string into a 70-byte value field.
fn insert_comment(field: &mut [u8; 70], comment: &str) {
    let content_end = if field[0] == b'\'' {
        value_text(field).len()
    } else {
        20
    };

    let sep_start = content_end + 1;
    if sep_start + 3 >= 70 {
        return;
    }

    field[sep_start] = b'/';
    let comment_start = sep_start + 2;
    let bytes = comment.as_bytes();
    let len = bytes.len().min(70 - comment_start);
    field[comment_start..comment_start + len].copy_from_slice(&bytes[..len]);
}

/// Create the standard FITS END card.
pub fn format_end_card() -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..3].copy_from_slice(b"END");
    buf
}

/// Serialize a sequence of header cards into complete FITS header blocks.
///
/// Appends the END card and pads the final block with blank cards.
pub fn serialize_header(cards: &[Card]) -> Vec<u8> {
    let total_cards = cards.len() + 1;
    let total_bytes = total_cards.div_ceil(CARDS_PER_BLOCK) * BLOCK_SIZE;

    let mut buf = Vec::with_capacity(total_bytes);
    for card in cards {
        buf.extend_from_slice(&format_card(card));
    }
    buf.extend_from_slice(&format_end_card());
    buf.resize(total_bytes, HEADER_PAD_BYTE);
    buf
}

// ── Keyword access ──

/// Characters of string content per long-string card, ampersand included.
const LONG_STRING_CHUNK: usize = 68;

/// An editable header: the ordered cards of one HDU, END excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn from_cards(mut cards: Vec<Card>) -> Self {
        cards.retain(|c| !c.is_end());
        Header { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards, END excluded.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serialize_header(&self.cards)
    }

    /// Index of the first value card named `name`.
    pub fn position(&self, name: &str) -> Result<usize> {
        let keyword = make_keyword(name)?;
        self.cards
            .iter()
            .position(|c| c.keyword == keyword && c.value.is_some())
            .ok_or_else(|| Error::MissingKeyword(keyword_name(&keyword)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_ok()
    }

    /// The card named `name`.
    pub fn card(&self, name: &str) -> Result<&Card> {
        Ok(&self.cards[self.position(name)?])
    }

    /// The formatted 80-byte image of the card named `name`.
    pub fn raw_card(&self, name: &str) -> Result<[u8; CARD_SIZE]> {
        self.card(name).map(format_card)
    }

    /// The formatted image of the `n`th card, counting from 1.
    pub fn record(&self, n: usize) -> Result<[u8; CARD_SIZE]> {
        n.checked_sub(1)
            .and_then(|i| self.cards.get(i))
            .map(format_card)
            .ok_or(Error::RecordOutOfBounds(n))
    }

    /// The defined value of `name`; a blank value is an error.
    pub fn value(&self, name: &str) -> Result<&Value> {
        let card = self.card(name)?;
        match card.value {
            Some(Value::Undefined) | None => {
                Err(Error::UndefinedValue(card.keyword_str().to_string()))
            }
            Some(ref v) => Ok(v),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64> {
        match self.value(name)? {
            Value::Integer(n) => Ok(*n),
            Value::Logical(b) => Ok(i64::from(*b)),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(*f as i64),
            _ => Err(Error::InvalidValue(name.to_string())),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        match self.value(name)? {
            Value::Float(f) => Ok(*f),
            Value::Integer(n) => Ok(*n as f64),
            Value::Logical(b) => Ok(f64::from(u8::from(*b))),
            _ => Err(Error::InvalidValue(name.to_string())),
        }
    }

    /// A string value, following `CONTINUE` cards when the value ends in `&`.
    ///
    /// Non-string values are returned as their value text.
    pub fn long_string(&self, name: &str) -> Result<(String, Option<String>)> {
        let idx = self.position(name)?;
        let card = &self.cards[idx];
        let mut text = match card.value {
            Some(Value::String(ref s)) => s.clone(),
            Some(Value::Undefined) | None => {
                return Err(Error::UndefinedValue(card.keyword_str().to_string()))
            }
            Some(_) => {
                let raw = format_card(card);
                return Ok((value_text(&raw[10..]).to_string(), card.comment.clone()));
            }
        };

        let mut comment = card.comment.clone();
        for next in &self.cards[idx + 1..] {
            let Some(stripped) = text.strip_suffix('&') else {
                break;
            };
            match (next.is_continue(), &next.value) {
                (true, Some(Value::String(chunk))) => text = format!("{stripped}{chunk}"),
                _ => break,
            }
            if next.comment.is_some() {
                comment.clone_from(&next.comment);
            }
        }
        Ok((text, comment))
    }

    /// Set `name` to `value`, appending the card if absent.
    ///
    /// A `None` comment keeps the card's current comment.
    pub fn update(&mut self, name: &str, value: Value, comment: Option<&str>) -> Result<()> {
        match self.position(name) {
            Ok(idx) => {
                self.remove_continuations(idx);
                let card = &mut self.cards[idx];
                card.value = Some(value);
                if let Some(c) = comment {
                    card.comment = Some(String::from(c));
                }
            }
            Err(Error::MissingKeyword(_)) => self.cards.push(Card::new(name, value, comment)?),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Set a string value, spreading it over `CONTINUE` cards when it does
    /// not fit a single card.
    pub fn update_long_string(&mut self, name: &str, value: &str, comment: Option<&str>) -> Result<()> {
        let chunks = split_long_string(value);
        if chunks.len() == 1 {
            return self.update(name, Value::String(value.to_string()), comment);
        }

        let keyword = make_keyword(name)?;
        let (idx, old_comment) = match self.position(name) {
            Ok(idx) => {
                self.remove_continuations(idx);
                (idx, self.cards.remove(idx).comment)
            }
            Err(Error::MissingKeyword(_)) => (self.cards.len(), None),
            Err(e) => return Err(e),
        };
        let comment = comment.map(String::from).or(old_comment);

        let last = chunks.len() - 1;
        let new_cards = chunks.into_iter().enumerate().map(|(i, chunk)| Card {
            keyword: if i == 0 { keyword } else { *KW_CONTINUE },
            value: Some(Value::String(chunk)),
            comment: if i == last { comment.clone() } else { None },
        });
        self.cards.splice(idx..idx, new_cards);

        if !self.contains("LONGSTRN") {
            self.cards.push(Card::new(
                "LONGSTRN",
                Value::String(String::from("OGIP 1.0")),
                Some("The OGIP long string convention may be used."),
            )?);
        }
        Ok(())
    }

    /// Give the card named `old` the keyword `new`, keeping value and comment.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let keyword = make_keyword(new)?;
        if is_commentary_keyword(&keyword) || &keyword == KW_CONTINUE {
            return Err(Error::InvalidKeyword);
        }
        let idx = self.position(old)?;
        self.cards[idx].keyword = keyword;
        Ok(())
    }

    /// Insert `card` before index `idx`, or append when `idx` is past the end.
    pub fn insert(&mut self, idx: usize, card: Card) {
        let idx = idx.min(self.cards.len());
        self.cards.insert(idx, card);
    }

    pub(crate) fn cards_mut(&mut self) -> &mut Vec<Card> {
        &mut self.cards
    }

    /// Remove `name` and any `CONTINUE` cards that follow it.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let idx = self.position(name)?;
        self.remove_continuations(idx);
        self.cards.remove(idx);
        Ok(())
    }

    /// Append a COMMENT or HISTORY record, wrapping text over several cards.
    pub fn append_commentary(&mut self, name: &str, text: &str) -> Result<()> {
        let keyword = make_keyword(name)?;
        let bytes = text.as_bytes();
        if bytes.is_empty() {
            self.cards.push(Card {
                keyword,
                value: None,
                comment: None,
            });
            return Ok(());
        }
        for piece in bytes.chunks(72) {
            let piece = str::from_utf8(piece).map_err(|_| Error::InvalidValue(name.to_string()))?;
            self.cards.push(Card {
                keyword,
                value: None,
                comment: Some(String::from(piece)),
            });
        }
        Ok(())
    }

    fn remove_continuations(&mut self, idx: usize) {
        let end = self.cards[idx + 1..]
            .iter()
            .position(|c| !c.is_continue())
            .map(|p| idx + 1 + p)
            .unwrap_or(self.cards.len());
        self.cards.drain(idx + 1..end);
    }
}

fn keyword_name(keyword: &[u8; 8]) -> String {
    String::from_utf8_lossy(keyword).trim_end().to_string()
}

/// Split a string into long-string chunks; all but the last end with `&`.
fn split_long_string(value: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = value;
    while escaped_len(rest) > LONG_STRING_CHUNK {
        let mut width = 0;
        let mut cut = 0;
        for (i, ch) in rest.char_indices() {
            let w = if ch == '\'' { 2 } else { ch.len_utf8() };
            if width + w > LONG_STRING_CHUNK - 1 {
                break;
            }
            width += w;
            cut = i + ch.len_utf8();
        }
        chunks.push(format!("{}&", &rest[..cut]));
        rest = &rest[cut..];
    }
    chunks.push(rest.to_string());
    chunks
}
