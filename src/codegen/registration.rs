//! Wiring a new model into the central files of the target codebase.
//!
//! Two files list every model by hand: the migration registry
//! (`DB.AutoMigrate(&models.User{}, ...)`) and the server bootstrap
//! (`[]controllers.Controller{ &controllers.UserController{}, ... }`).
//! Each [`RegistrationTarget`] is a text transform over one of them.
//! Applying a transform twice yields the same text as applying it once.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use strum::Display;

use crate::codegen::emit::{StagedWrite, WriteTarget};
use crate::error::RegistrationError;
use crate::schema::Schema;

/// What a registration target needs to know about the new model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationEntry {
    pub model_name: String,
    pub controller_name: String,
    pub fields: Vec<String>,
}

impl RegistrationEntry {
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            model_name: schema.model_name().to_string(),
            controller_name: schema.controller_name(),
            fields: schema.fields().map(|f| f.name().to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationOutcome {
    Inserted,
    AlreadyPresent,
    /// Not attempted (sandboxed runs never touch central files).
    Skipped,
}

/// Result of planning one registration, before anything is written.
#[derive(Debug, Clone)]
pub struct PlannedRegistration {
    pub target: &'static str,
    pub path: PathBuf,
    pub outcome: RegistrationOutcome,
    pub write: Option<StagedWrite>,
}

pub trait RegistrationTarget {
    fn name(&self) -> &'static str;

    /// Text that opens the list this target inserts into.
    fn anchor(&self) -> &'static str;

    fn path(&self) -> &Path;

    /// Returns the rewritten source, or `None` when the entry is already
    /// registered.
    fn apply(
        &self,
        source: &str,
        entry: &RegistrationEntry,
    ) -> Result<Option<String>, RegistrationError>;

    /// Reads the target file and stages the rewrite, if one is needed.
    fn plan(&self, entry: &RegistrationEntry) -> Result<PlannedRegistration, RegistrationError> {
        let path = self.path().to_path_buf();
        let source = fs::read_to_string(&path).map_err(|source| RegistrationError::Io {
            target: self.name(),
            path: path.clone(),
            source,
        })?;

        let (outcome, write) = match self.apply(&source, entry)? {
            Some(contents) => (
                RegistrationOutcome::Inserted,
                Some(StagedWrite {
                    target: WriteTarget::Registration(self.name()),
                    path: path.clone(),
                    contents,
                    create_new: false,
                }),
            ),
            None => (RegistrationOutcome::AlreadyPresent, None),
        };
        tracing::debug!(
            target_name = self.name(),
            model = %entry.model_name,
            fields = entry.fields.len(),
            path = %path.display(),
            %outcome,
            "registration planned"
        );
        Ok(PlannedRegistration {
            target: self.name(),
            path,
            outcome,
            write,
        })
    }

    fn skipped(&self) -> PlannedRegistration {
        PlannedRegistration {
            target: self.name(),
            path: self.path().to_path_buf(),
            outcome: RegistrationOutcome::Skipped,
            write: None,
        }
    }
}

/// Adds `&models.<Model>{}` to the `AutoMigrate(` call.
#[derive(Debug, Clone)]
pub struct MigrationRegistration {
    path: PathBuf,
}

impl MigrationRegistration {
    pub const ANCHOR: &'static str = "AutoMigrate(";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RegistrationTarget for MigrationRegistration {
    fn name(&self) -> &'static str {
        "migration"
    }

    fn anchor(&self) -> &'static str {
        Self::ANCHOR
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn apply(
        &self,
        source: &str,
        entry: &RegistrationEntry,
    ) -> Result<Option<String>, RegistrationError> {
        let list = ListSpan::find(source, self.anchor(), '(', ')')
            .ok_or_else(|| self.anchor_not_found())?;
        let item = format!("&models.{}{{}}", entry.model_name);
        if list.contains_item(&item) {
            return Ok(None);
        }
        Ok(Some(list.append(source, &item, ListStyle::Trailing)))
    }
}

impl MigrationRegistration {
    fn anchor_not_found(&self) -> RegistrationError {
        RegistrationError::AnchorNotFound {
            target: self.name(),
            anchor: self.anchor(),
            path: self.path.clone(),
        }
    }
}

/// Adds `&controllers.<Model>Controller{},` to the controller list.
#[derive(Debug, Clone)]
pub struct RouteRegistration {
    path: PathBuf,
}

impl RouteRegistration {
    pub const ANCHOR: &'static str = "[]controllers.Controller{";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RegistrationTarget for RouteRegistration {
    fn name(&self) -> &'static str {
        "routes"
    }

    fn anchor(&self) -> &'static str {
        Self::ANCHOR
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn apply(
        &self,
        source: &str,
        entry: &RegistrationEntry,
    ) -> Result<Option<String>, RegistrationError> {
        let list = ListSpan::find(source, self.anchor(), '{', '}').ok_or_else(|| {
            RegistrationError::AnchorNotFound {
                target: self.name(),
                anchor: self.anchor(),
                path: self.path.clone(),
            }
        })?;
        let item = format!("&controllers.{}{{}}", entry.controller_name);
        if list.contains_item(&item) {
            return Ok(None);
        }
        Ok(Some(list.append(source, &item, ListStyle::Terminated)))
    }
}

/// How items in a list are separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListStyle {
    /// `a,\n b)`: the closing delimiter follows the last item.
    Trailing,
    /// `a,\n b,\n}`: every item carries its own comma.
    Terminated,
}

/// Byte range of a delimited list body: `open` is just past the opening
/// delimiter, `close` is the index of the matching closing delimiter.
///
/// `code` is the source with comments and literal contents blanked to
/// spaces, byte for byte, so offsets into it are offsets into the source.
#[derive(Debug, Clone)]
struct ListSpan {
    code: String,
    open: usize,
    close: usize,
}

impl ListSpan {
    fn find(source: &str, anchor: &str, open_delim: char, close_delim: char) -> Option<Self> {
        let code = blank_comments_and_literals(source);
        let open = code.find(anchor)? + anchor.len();
        let mut depth = 0usize;
        let mut close = None;
        for (offset, ch) in code[open..].char_indices() {
            if ch == open_delim {
                depth += 1;
            } else if ch == close_delim {
                if depth == 0 {
                    close = Some(open + offset);
                    break;
                }
                depth -= 1;
            }
        }
        Some(Self {
            open,
            close: close?,
            code,
        })
    }

    fn body(&self) -> &str {
        &self.code[self.open..self.close]
    }

    fn contains_item(&self, item: &str) -> bool {
        self.body()
            .split(',')
            .any(|candidate| candidate.trim() == item)
    }

    fn append(&self, source: &str, item: &str, style: ListStyle) -> String {
        let body = self.body();
        let content_end = self.open + body.trim_end().len();
        let last_line = body
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(leading_whitespace);
        let multiline = body.contains('\n');
        let had_trailing_comma = self.code[..content_end].ends_with(',');
        // End of the last item's line when the closing delimiter sits on a
        // later line. A trailing comment on that line stays with its item.
        let line_end = self.code[content_end..self.close]
            .find('\n')
            .map(|offset| content_end + offset)
            .map(|end| {
                if self.code[..end].ends_with('\r') {
                    end - 1
                } else {
                    end
                }
            });

        let mut out = String::with_capacity(source.len() + item.len() + 8);
        match (last_line, line_end) {
            (None, _) => {
                // Empty list.
                out.push_str(&source[..self.close]);
                out.push_str(item);
                if style == ListStyle::Terminated {
                    out.push(',');
                }
                out.push_str(&source[self.close..]);
            }
            (Some(indent), Some(line_end)) => {
                out.push_str(&source[..content_end]);
                if !had_trailing_comma {
                    out.push(',');
                }
                let newline = if self.code[line_end..].starts_with('\r') {
                    "\r\n"
                } else {
                    "\n"
                };
                out.push_str(&source[content_end..line_end]);
                out.push_str(newline);
                out.push_str(indent);
                out.push_str(item);
                out.push(',');
                out.push_str(&source[line_end..]);
            }
            (Some(indent), None) => {
                out.push_str(&source[..content_end]);
                if !had_trailing_comma {
                    out.push(',');
                }
                if multiline {
                    out.push('\n');
                    out.push_str(indent);
                } else {
                    out.push(' ');
                }
                out.push_str(item);
                if had_trailing_comma {
                    out.push(',');
                }
                out.push_str(&source[content_end..]);
            }
        }
        out
    }
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    LineComment,
    BlockComment,
    Literal(char),
}

/// Replaces Go comments and the contents of string and rune literals with
/// spaces. Newlines and byte offsets are kept.
fn blank_comments_and_literals(source: &str) -> String {
    fn blank(out: &mut String, ch: char) {
        if ch == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        }
    }

    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut state = Scan::Code;
    while let Some(ch) = chars.next() {
        match state {
            Scan::Code => match (ch, chars.peek().copied()) {
                ('/', Some('/')) => {
                    state = Scan::LineComment;
                    blank(&mut out, ch);
                }
                ('/', Some('*')) => {
                    chars.next();
                    state = Scan::BlockComment;
                    out.push_str("  ");
                }
                ('"' | '`' | '\'', _) => {
                    state = Scan::Literal(ch);
                    out.push(ch);
                }
                _ => out.push(ch),
            },
            Scan::LineComment => {
                if ch == '\n' {
                    state = Scan::Code;
                }
                blank(&mut out, ch);
            }
            Scan::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = Scan::Code;
                    out.push_str("  ");
                } else {
                    blank(&mut out, ch);
                }
            }
            Scan::Literal(quote) => {
                if ch == quote {
                    state = Scan::Code;
                    out.push(ch);
                } else if ch == '\\' && quote != '`' {
                    blank(&mut out, ch);
                    if let Some(escaped) = chars.next() {
                        blank(&mut out, escaped);
                    }
                } else {
                    blank(&mut out, ch);
                }
            }
        }
    }
    out
}
