use regex::Regex;
use tracing::debug;

use super::{Dialect, Song, CODE_WIDTH};

/// Where the parsed records come from. Every song gets tagged with these.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub catalog_id: &'a str,
    pub catalog_label: &'a str,
    pub dialect: Dialect,
}

/// Line-oriented parser for both catalog dialects.
///
/// Parsing is best-effort: a malformed line never aborts the whole source.
/// Missing fields come back as empty strings, extra fields are ignored, and
/// blank lines produce nothing.
pub struct RecordParser {
    // One field per match: quoted field (group 1) or plain field (group 2)
    csv_field: Option<Regex>,
}

impl RecordParser {
    pub fn new() -> Self {
        let csv_field = Regex::new(r#"(?:^|,)\s*(?:"([^"]*)"|([^,]*))"#).ok();
        Self { csv_field }
    }

    pub fn parse(&self, raw: &str, ctx: &ParseContext<'_>) -> Vec<Song> {
        let songs = match ctx.dialect {
            Dialect::Csv => self.parse_csv(raw, ctx),
            Dialect::Pipe => self.parse_pipe(raw, ctx),
        };
        debug!(
            "Parsed {} records from catalog '{}' ({:?})",
            songs.len(),
            ctx.catalog_id,
            ctx.dialect
        );
        songs
    }

    fn parse_csv(&self, raw: &str, ctx: &ParseContext<'_>) -> Vec<Song> {
        // First line is the header, whatever it contains
        raw.split('\n')
            .skip(1)
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let fields = self.split_csv_line(line);
                if fields.len() != 3 {
                    debug!("Malformed CSV line in '{}': {:?}", ctx.catalog_id, line);
                }
                build_song(fields, ctx, |code| code.to_string())
            })
            .collect()
    }

    fn split_csv_line(&self, line: &str) -> Vec<String> {
        let regex = match (&self.csv_field, line.contains('"')) {
            (Some(regex), true) => regex,
            _ => return line.split(',').map(|value| value.trim().to_string()).collect(),
        };

        regex
            .captures_iter(line)
            .map(|caps| {
                let value = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                strip_quotes(value)
            })
            .collect()
    }

    fn parse_pipe(&self, raw: &str, ctx: &ParseContext<'_>) -> Vec<Song> {
        raw.split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let fields: Vec<String> = line.split('|').map(|f| f.trim().to_string()).collect();
                if fields.len() != 3 {
                    debug!("Malformed disc line in '{}': {:?}", ctx.catalog_id, line);
                }
                build_song(fields, ctx, pad_code)
            })
            .collect()
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a whole catalog source with a throwaway parser
pub fn parse(raw: &str, ctx: &ParseContext<'_>) -> Vec<Song> {
    RecordParser::new().parse(raw, ctx)
}

/// Left-pad a code with zeros to `CODE_WIDTH`. Longer codes stay as they are.
pub fn pad_code(code: &str) -> String {
    format!("{:0>width$}", code, width = CODE_WIDTH)
}

fn strip_quotes(value: &str) -> String {
    value.trim().trim_matches('"').trim().to_string()
}

fn build_song(
    fields: Vec<String>,
    ctx: &ParseContext<'_>,
    normalize_code: impl Fn(&str) -> String,
) -> Song {
    let mut fields = fields.into_iter();
    let code = fields.next().unwrap_or_default();
    let title = fields.next().unwrap_or_default();
    let artist = fields.next().unwrap_or_default();

    Song {
        code: normalize_code(&code),
        title,
        artist,
        catalog_id: ctx.catalog_id.to_string(),
        catalog_label: ctx.catalog_label.to_string(),
    }
}
