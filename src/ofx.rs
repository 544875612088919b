use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{ReconError, Result};
use crate::fmt::parse_amount;
use crate::models::{description_or, Transaction};

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// UTF-8 if the bytes are valid UTF-8, otherwise Latin-1. Never fails.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            tracing::debug!("OFX input is not UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

/// An OFX element. Aggregates have children; leaves carry text.
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    fn new(name: &str, text: &str) -> Self {
        let text = text.trim();
        Self {
            name: name.to_ascii_uppercase(),
            text: (!text.is_empty()).then(|| decode_entities(text)),
            children: Vec::new(),
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.text.as_deref())
    }

    fn find_first(&self, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find_map(|c| if c.name == name { Some(c) } else { c.find_first(name) })
    }

    /// Every element named in `names`, in document order. Does not descend into matches.
    fn find_all<'a>(&'a self, names: &[&str], out: &mut Vec<&'a Element>) {
        for c in &self.children {
            if names.contains(&c.name.as_str()) {
                out.push(c);
            } else {
                c.find_all(names, out);
            }
        }
    }
}

/// OFX aggregates. Anything else is a leaf unless the document closes it.
const AGGREGATES: &[&str] = &[
    "OFX",
    "SONRS",
    "STATUS",
    "FI",
    "STMTTRNRS",
    "CCSTMTTRNRS",
    "STMTRS",
    "CCSTMTRS",
    "BANKACCTFROM",
    "BANKACCTTO",
    "CCACCTFROM",
    "CCACCTTO",
    "BANKTRANLIST",
    "STMTTRN",
    "PAYEE",
    "CURRENCY",
    "ORIGCURRENCY",
    "LEDGERBAL",
    "AVAILBAL",
    "BALLIST",
    "BAL",
];

fn is_known_aggregate(name: &str) -> bool {
    AGGREGATES.contains(&name) || name.ends_with("MSGSRSV1") || name.ends_with("MSGSRSV2")
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9_.]*)\s*(/?)>").unwrap())
}

struct Tag<'a> {
    closing: bool,
    self_closing: bool,
    name: String,
    /// Everything up to the next tag, so a literal `<` stays in the text.
    text: &'a str,
}

fn tokenize(body: &str) -> Vec<Tag<'_>> {
    let caps: Vec<_> = tag_regex().captures_iter(body).collect();
    caps.iter()
        .enumerate()
        .map(|(i, cap)| {
            let end = cap.get(0).map_or(0, |m| m.end());
            let next = caps
                .get(i + 1)
                .and_then(|c| c.get(0))
                .map_or(body.len(), |m| m.start());
            Tag {
                closing: !cap[1].is_empty(),
                self_closing: !cap[3].is_empty(),
                name: cap[2].to_ascii_uppercase(),
                text: &body[end..next],
            }
        })
        .collect()
}

/// Pop the top element and attach it to its parent.
fn close_top(stack: &mut Vec<Element>) {
    if stack.len() > 1 {
        if let Some(done) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(done);
            }
        }
    }
}

/// Build the element tree for an OFX body.
///
/// SGML leaves (OFX 1.x) have no closing tag: a leaf is closed implicitly by
/// the next tag, and a closing aggregate tag closes every open leaf above it.
/// An element is a leaf when it carries text, or when it is neither a known
/// aggregate nor closed anywhere in the document, so an empty `<NAME>` never
/// swallows its siblings. XML leaves (OFX 2.x) close explicitly and go
/// through the same path.
fn parse_tree(body: &str) -> Result<Element> {
    let tags = tokenize(body);
    let closed: HashSet<&str> = tags
        .iter()
        .filter(|t| t.closing)
        .map(|t| t.name.as_str())
        .collect();
    let is_aggregate = |e: &Element| {
        e.text.is_none() && (is_known_aggregate(&e.name) || closed.contains(e.name.as_str()))
    };

    let mut stack = vec![Element::default()];
    for tag in &tags {
        if tag.closing {
            let Some(pos) = stack
                .iter()
                .rposition(|e| e.name == tag.name)
                .filter(|&p| p > 0)
            else {
                return Err(ReconError::StructuralParse(format!(
                    "unexpected closing tag </{}>",
                    tag.name
                )));
            };
            while stack.len() > pos + 1 {
                if let Some(top) = stack.last().filter(|&top| is_aggregate(top)) {
                    return Err(ReconError::StructuralParse(format!(
                        "<{}> is never closed before </{}>",
                        top.name, tag.name
                    )));
                }
                close_top(&mut stack);
            }
            close_top(&mut stack);
            continue;
        }

        if stack.len() > 1 && stack.last().is_some_and(|top| !is_aggregate(top)) {
            close_top(&mut stack);
        }
        if tag.self_closing {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(Element::new(&tag.name, ""));
            }
        } else {
            stack.push(Element::new(&tag.name, tag.text));
        }
    }

    while stack.len() > 1 {
        if let Some(top) = stack.last() {
            if is_aggregate(top) {
                return Err(ReconError::StructuralParse(format!(
                    "<{}> is never closed",
                    top.name
                )));
            }
        }
        close_top(&mut stack);
    }
    stack
        .pop()
        .ok_or_else(|| ReconError::StructuralParse("empty document".to_string()))
}

/// Offset of the `<OFX>` root, skipping the SGML header or XML prolog.
fn body_start(text: &str) -> Option<usize> {
    let upper = text.to_ascii_uppercase();
    let mut from = 0;
    while let Some(i) = upper[from..].find("<OFX") {
        let at = from + i;
        let rest = &upper[at + 4..];
        if rest.starts_with('>') || rest.starts_with(|c: char| c.is_whitespace()) {
            return Some(at);
        }
        from = at + 4;
    }
    None
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

fn parse_posted_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..8)?;
    if !day.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(day, "%Y%m%d").ok()
}

fn parse_stmttrn(trn: &Element, index: usize, placeholder: &str) -> Result<Transaction> {
    let posted = trn.value("DTPOSTED").ok_or_else(|| {
        ReconError::StructuralParse(format!("transaction {index}: missing <DTPOSTED>"))
    })?;
    let date = parse_posted_date(posted).ok_or_else(|| {
        ReconError::StructuralParse(format!("transaction {index}: invalid DTPOSTED '{posted}'"))
    })?;

    let raw_amount = trn.value("TRNAMT").ok_or_else(|| {
        ReconError::StructuralParse(format!("transaction {index}: missing <TRNAMT>"))
    })?;
    let amount = parse_amount(raw_amount).ok_or_else(|| {
        ReconError::StructuralParse(format!("transaction {index}: invalid TRNAMT '{raw_amount}'"))
    })?;

    let description = description_or(trn.value("MEMO").or_else(|| trn.value("NAME")), placeholder);
    Ok(Transaction::new(date, description, amount))
}

/// Parse an OFX document (1.x SGML or 2.x XML) into a flat transaction table.
///
/// Transactions from every statement are concatenated in document order.
/// Any structural problem fails the whole document.
pub fn parse(bytes: &[u8], placeholder: &str) -> Result<Vec<Transaction>> {
    let text = decode_text(bytes);
    let start = body_start(&text)
        .ok_or_else(|| ReconError::StructuralParse("missing <OFX> root element".to_string()))?;
    let tree = parse_tree(&text[start..])?;

    let ofx = tree
        .child("OFX")
        .ok_or_else(|| ReconError::StructuralParse("missing <OFX> root element".to_string()))?;
    ofx.find_first("SONRS").ok_or_else(|| {
        ReconError::StructuralParse("missing <SONRS> signon response".to_string())
    })?;

    let mut responses = Vec::new();
    ofx.find_all(&["STMTTRNRS", "CCSTMTTRNRS"], &mut responses);
    if responses.is_empty() {
        return Err(ReconError::StructuralParse(
            "no <STMTTRNRS> statement response".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for response in &responses {
        let statement = response
            .child("STMTRS")
            .or_else(|| response.child("CCSTMTRS"))
            .ok_or_else(|| {
                ReconError::StructuralParse(format!("<{}> without a statement", response.name))
            })?;
        let list = statement.child("BANKTRANLIST").ok_or_else(|| {
            ReconError::StructuralParse(format!("<{}> without <BANKTRANLIST>", statement.name))
        })?;
        for trn in list.children.iter().filter(|c| c.name == "STMTTRN") {
            rows.push(parse_stmttrn(trn, rows.len() + 1, placeholder)?);
        }
    }

    tracing::debug!(
        statements = responses.len(),
        transactions = rows.len(),
        "parsed OFX document"
    );
    Ok(rows)
}
