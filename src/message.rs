use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use encoding_rs::Encoding;
use log::warn;
use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Body media types in order of preference.
const BODY_PREFERENCE: [&str; 2] = ["text/plain", "text/html"];

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The parts of an inbound message the responder needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEmail {
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
    pub body: String,
}

impl ParsedEmail {
    pub fn parse(raw: &str) -> Self {
        let mail = match mailparse::parse_mail(raw.as_bytes()) {
            Ok(mail) => mail,
            Err(e) => {
                warn!("Unparseable message, treating it as a bare body: {e}");
                return Self {
                    body: raw.trim().to_string(),
                    ..Self::default()
                };
            }
        };

        let header = |name: &str| {
            mail.headers
                .get_first_value(name)
                .map(|value| decode_unpadded_words(&value))
        };

        let body = match select_body(&mail) {
            Some(part) => part.get_body().unwrap_or_else(|e| {
                warn!("Undecodable {} body: {e}", part.ctype.mimetype);
                String::new()
            }),
            None => String::new(),
        };

        Self {
            from: header("From"),
            to: header("To"),
            subject: header("Subject"),
            date: mail.headers.get_first_value("Date"),
            body: body.trim().to_string(),
        }
    }

    /// First `max_chars` characters of the body.
    pub fn body_sample(&self, max_chars: usize) -> &str {
        match self.body.char_indices().nth(max_chars) {
            Some((offset, _)) => &self.body[..offset],
            None => &self.body,
        }
    }
}

/// Picks the preferred text part. Attachments are never candidates, and a
/// `multipart/related` container only offers its root part (the one named by
/// `start`, else the first).
fn select_body<'p, 'a>(mail: &'p ParsedMail<'a>) -> Option<&'p ParsedMail<'a>> {
    let mut candidates = Vec::new();
    collect_body_candidates(mail, &mut candidates);
    candidates
        .into_iter()
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, part)| part)
}

fn collect_body_candidates<'p, 'a>(
    part: &'p ParsedMail<'a>,
    candidates: &mut Vec<(usize, &'p ParsedMail<'a>)>,
) {
    if matches!(
        part.get_content_disposition().disposition,
        DispositionType::Attachment
    ) {
        return;
    }

    let mimetype = part.ctype.mimetype.to_ascii_lowercase();
    if mimetype.starts_with("text/") {
        if let Some(rank) = BODY_PREFERENCE.iter().position(|t| *t == mimetype) {
            candidates.push((rank, part));
        }
        return;
    }
    if !mimetype.starts_with("multipart/") || part.subparts.is_empty() {
        return;
    }

    if mimetype != "multipart/related" {
        for subpart in &part.subparts {
            collect_body_candidates(subpart, candidates);
        }
        return;
    }

    let root = part
        .ctype
        .params
        .get("start")
        .and_then(|start| {
            part.subparts.iter().find(|subpart| {
                subpart
                    .headers
                    .get_first_value("Content-ID")
                    .is_some_and(|id| id.trim() == start.trim())
            })
        })
        .or_else(|| part.subparts.first());
    if let Some(root) = root {
        collect_body_candidates(root, candidates);
    }
}

fn unpadded_word_regex() -> &'static Regex {
    static UNPADDED_WORD: OnceLock<Regex> = OnceLock::new();
    UNPADDED_WORD.get_or_init(|| {
        Regex::new(r"=\?([^?\s]+)\?[Bb]\?([A-Za-z0-9+/]+)\?=")
            .expect("encoded-word pattern is valid")
    })
}

/// Decodes `B` encoded words whose payload lost its base64 padding. The
/// header decoder leaves those as raw `=?charset?B?...?=` text.
fn decode_unpadded_words(value: &str) -> String {
    if !value.contains("=?") {
        return value.to_string();
    }

    unpadded_word_regex()
        .replace_all(value, |caps: &Captures| {
            let decoded = Encoding::for_label(caps[1].as_bytes())
                .zip(LENIENT_BASE64.decode(&caps[2]).ok());
            match decoded {
                Some((encoding, bytes)) => {
                    encoding.decode_without_bom_handling(&bytes).0.into_owned()
                }
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
