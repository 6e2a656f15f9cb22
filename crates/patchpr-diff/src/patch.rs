//! Unified diff parsing.
//!
//! The parser is a small state machine (`NoFile → InFile → InHunk`) fed one
//! line at a time. It never fails: lines it cannot place are dropped and,
//! where that loses information, recorded as a [`ParseDiagnostic`].

use std::fmt;

use serde::Serialize;

/// Classification of a line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTag {
    /// Unchanged line, present in both versions.
    Context,
    /// Line added by the patch.
    Add,
    /// Line removed by the patch.
    Remove,
}

/// A single tagged line of a hunk, without its leading marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HunkLine {
    pub tag: LineTag,
    pub text: String,
}

/// A hunk of changes (`@@ -old_start,old_count +new_start,new_count @@`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    /// Starting line in the original file (1-indexed, 0 for an empty original).
    pub old_start: u32,
    /// Number of original lines covered.
    pub old_count: u32,
    /// Starting line in the new file.
    pub new_start: u32,
    /// Number of new lines covered.
    pub new_count: u32,
    /// Tagged lines in patch order.
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    const fn new(old: (u32, u32), new: (u32, u32)) -> Self {
        Self {
            old_start: old.0,
            old_count: old.1,
            new_start: new.0,
            new_count: new.1,
            lines: Vec::new(),
        }
    }

    /// Number of original lines this hunk consumes (context + removed).
    #[must_use]
    pub fn old_consumed(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.tag != LineTag::Add)
            .count()
    }

    /// Number of new lines this hunk produces (context + added).
    #[must_use]
    pub fn new_produced(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.tag != LineTag::Remove)
            .count()
    }

    fn expects_old(&self) -> bool {
        self.old_consumed() < self.old_count as usize
    }

    fn expects_new(&self) -> bool {
        self.new_produced() < self.new_count as usize
    }
}

/// How a file is affected by a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    New,
    Deleted,
    Modified,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Deleted => write!(f, "deleted"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// All changes a patch makes to one file.
///
/// `is_new` and `is_deleted` are never both set. `added_lines` and
/// `removed_lines` flatten the hunks and are what a new file is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub is_new: bool,
    pub is_deleted: bool,
    pub hunks: Vec<Hunk>,
    pub added_lines: Vec<String>,
    pub removed_lines: Vec<String>,
}

impl FileChange {
    /// Get the kind of change.
    #[must_use]
    pub const fn kind(&self) -> FileKind {
        if self.is_deleted {
            FileKind::Deleted
        } else if self.is_new {
            FileKind::New
        } else {
            FileKind::Modified
        }
    }

    fn mark_new(&mut self) {
        self.is_new = true;
        self.is_deleted = false;
    }

    fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.is_new = false;
    }

    fn push_line(&mut self, tag: LineTag, text: &str) {
        match tag {
            LineTag::Add => self.added_lines.push(text.to_string()),
            LineTag::Remove => self.removed_lines.push(text.to_string()),
            LineTag::Context => {}
        }
        if let Some(hunk) = self.hunks.last_mut() {
            hunk.lines.push(HunkLine {
                tag,
                text: text.to_string(),
            });
        }
    }
}

/// A file entry in a [`ParsedPatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchedFile {
    pub path: String,
    #[serde(flatten)]
    pub change: FileChange,
}

/// Why a line of the patch was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A line starting with `@@` that is not a valid hunk header.
    MalformedHunkHeader(String),
    /// A hunk header before any `+++` file header.
    OrphanHunk(String),
    /// A content-looking line with no open hunk to attach to.
    StrayContent(String),
}

/// A non-fatal problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    /// 1-based line number in the patch text.
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::MalformedHunkHeader(text) => {
                write!(f, "line {}: malformed hunk header {text:?}", self.line)
            }
            DiagnosticKind::OrphanHunk(text) => {
                write!(f, "line {}: hunk outside of a file {text:?}", self.line)
            }
            DiagnosticKind::StrayContent(text) => {
                write!(f, "line {}: content outside of a hunk {text:?}", self.line)
            }
        }
    }
}

/// A parsed patch: file path to change, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedPatch {
    files: Vec<PatchedFile>,
    diagnostics: Vec<ParseDiagnostic>,
}

impl ParsedPatch {
    /// Look up the change for a path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FileChange> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| &f.change)
    }

    /// Iterate over `(path, change)` pairs in patch order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileChange)> {
        self.files.iter().map(|f| (f.path.as_str(), &f.change))
    }

    /// Get the file entries in patch order.
    #[must_use]
    pub fn files(&self) -> &[PatchedFile] {
        &self.files
    }

    /// Number of files touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the patch touches no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Lines the parser skipped.
    #[must_use]
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    /// Check if any line had to be skipped.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    fn open(&mut self, path: &str) -> usize {
        if let Some(index) = self.files.iter().position(|f| f.path == path) {
            return index;
        }
        self.files.push(PatchedFile {
            path: path.to_string(),
            change: FileChange::default(),
        });
        self.files.len() - 1
    }
}

/// Parse a unified diff into a [`ParsedPatch`].
///
/// Never fails; malformed input yields a best-effort partial result.
#[must_use]
pub fn parse(text: &str) -> ParsedPatch {
    let mut parser = Parser::default();
    for (index, line) in text.split('\n').enumerate() {
        parser.feed(index + 1, line);
    }
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    NoFile,
    InFile {
        file: usize,
    },
    InHunk {
        file: usize,
    },
}

#[derive(Debug, Default)]
struct Parser {
    patch: ParsedPatch,
    state: State,
    /// Path from the last `--- a/` or `diff --git` header.
    old_path: Option<String>,
    /// A `--- /dev/null` was seen for the file about to be opened.
    pending_new: bool,
    /// Most recently opened file and the line it was opened on.
    last_opened: Option<(usize, usize)>,
}

impl Parser {
    /// Content keeps its bytes, `\r` included; headers are matched without it.
    fn feed(&mut self, number: usize, line: &str) {
        let header = line.strip_suffix('\r').unwrap_or(line);
        if let State::InHunk { file } = self.state
            && !is_file_header(header)
            && self.content_line(file, line)
        {
            return;
        }
        self.header_line(number, header);
    }

    /// Attach a line to the open hunk. Returns false if it is not content.
    ///
    /// Empty lines are never content, so a trailing newline cannot turn into
    /// a context line that consumes a base line.
    fn content_line(&mut self, file: usize, line: &str) -> bool {
        let change = &mut self.patch.files[file].change;
        let Some(hunk) = change.hunks.last() else {
            return false;
        };
        let (expects_old, expects_new) = (hunk.expects_old(), hunk.expects_new());

        let (tag, text) = match line.as_bytes().first() {
            Some(b'+') if expects_new || !line.starts_with("+++") => (LineTag::Add, &line[1..]),
            Some(b'-') if expects_old || !line.starts_with("---") => (LineTag::Remove, &line[1..]),
            Some(b' ') => (LineTag::Context, &line[1..]),
            Some(b'\\') => return true,
            _ => return false,
        };
        change.push_line(tag, text);
        true
    }

    /// Order each file's hunks by original position.
    ///
    /// A file header that repeats appends hunks to the existing entry, which
    /// can leave them out of order; the reconstructor walks them front to back.
    fn finish(mut self) -> ParsedPatch {
        for file in &mut self.patch.files {
            file.change.hunks.sort_by_key(|h| h.old_start);
        }
        self.patch
    }

    fn header_line(&mut self, number: usize, line: &str) {
        if line.starts_with("diff --git ") {
            self.old_path = parse_git_header(line);
            self.pending_new = false;
            self.state = State::NoFile;
        } else if let Some(rest) = line.strip_prefix("--- ") {
            self.old_header(number, strip_timestamp(rest));
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            self.new_header(number, strip_timestamp(rest));
        } else if line.starts_with("@@") {
            self.hunk_header(number, line);
        } else if let State::InFile { .. } | State::InHunk { .. } = self.state
            && matches!(line.as_bytes().first(), Some(b'+' | b'-' | b' '))
        {
            self.diagnose(number, DiagnosticKind::StrayContent(line.to_string()));
        }
    }

    fn old_header(&mut self, number: usize, path: &str) {
        if path == "/dev/null" {
            // Some tools emit the marker after `+++`; attach it to the file
            // opened on the previous line.
            if let Some((file, opened_at)) = self.last_opened
                && opened_at + 1 == number
                && self.patch.files[file].change.hunks.is_empty()
            {
                self.patch.files[file].change.mark_new();
            } else {
                self.pending_new = true;
                self.state = State::NoFile;
            }
            return;
        }

        self.old_path = Some(strip_side(path, "a/").to_string());
        self.pending_new = false;
        self.state = State::NoFile;
    }

    fn new_header(&mut self, number: usize, path: &str) {
        if path == "/dev/null" {
            let file = match self.old_path.take() {
                Some(old) => Some(self.patch.open(&old)),
                None => self.last_opened.map(|(file, _)| file),
            };
            if let Some(file) = file {
                self.patch.files[file].change.mark_deleted();
                self.last_opened = Some((file, number));
                self.state = State::InFile { file };
            }
            self.pending_new = false;
            return;
        }

        let file = self.patch.open(strip_side(path, "b/"));
        if self.pending_new {
            self.patch.files[file].change.mark_new();
        }
        self.pending_new = false;
        self.old_path = None;
        self.last_opened = Some((file, number));
        self.state = State::InFile { file };
    }

    fn hunk_header(&mut self, number: usize, line: &str) {
        let file = match self.state {
            State::InFile { file } | State::InHunk { file } => file,
            State::NoFile => {
                self.diagnose(number, DiagnosticKind::OrphanHunk(line.to_string()));
                return;
            }
        };

        if let Some((old, new)) = parse_hunk_header(line) {
            self.patch.files[file].change.hunks.push(Hunk::new(old, new));
            self.state = State::InHunk { file };
        } else {
            self.diagnose(number, DiagnosticKind::MalformedHunkHeader(line.to_string()));
            self.state = State::InFile { file };
        }
    }

    fn diagnose(&mut self, line: usize, kind: DiagnosticKind) {
        self.patch.diagnostics.push(ParseDiagnostic { line, kind });
    }
}

/// Check for `--- a/`, `+++ b/` or a `/dev/null` side, which always start a file.
fn is_file_header(line: &str) -> bool {
    ["--- a/", "--- /dev/null", "+++ b/", "+++ /dev/null"]
        .iter()
        .any(|p| line.starts_with(p))
}

/// Drop the tab-separated timestamp some diff tools append to file headers.
fn strip_timestamp(path: &str) -> &str {
    path.split('\t').next().unwrap_or(path).trim_end()
}

fn strip_side<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.strip_prefix(prefix).unwrap_or(path)
}

/// Extract the old path from `diff --git a/path b/path`.
fn parse_git_header(line: &str) -> Option<String> {
    let rest = line.strip_prefix("diff --git a/")?;
    let (old, _) = rest.rsplit_once(" b/")?;
    Some(old.to_string())
}

/// Parse a hunk header line like "@@ -1,3 +1,4 @@" or "@@ -1 +1,2 @@ fn foo()".
fn parse_hunk_header(line: &str) -> Option<((u32, u32), (u32, u32))> {
    let rest = line.strip_prefix("@@ -")?;
    let (ranges, _section) = rest.split_once(" @@")?;
    let (old, new) = ranges.split_once(" +")?;

    Some((parse_range(old)?, parse_range(new)?))
}

/// Parse a range like "1,3" or "1" into (start, count).
fn parse_range(s: &str) -> Option<(u32, u32)> {
    if let Some((start, count)) = s.split_once(',') {
        Some((start.parse().ok()?, count.parse().ok()?))
    } else {
        // Single line: "1" means start=1, count=1
        Some((s.parse().ok()?, 1))
    }
}
