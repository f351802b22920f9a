//! Embedded draft texts for the workflow assistant.

use include_dir::{Dir, include_dir};
use minijinja::{Environment, UndefinedBehavior, context};

use crate::domain::AppError;

static DRAFTS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/assets/drafts");

/// Output style for a drafted system prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DraftStyle {
    #[default]
    Markdown,
    Xml,
}

impl DraftStyle {
    /// Parse a user-supplied style name; anything but `xml` is markdown.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("xml") { DraftStyle::Xml } else { DraftStyle::Markdown }
    }

    fn asset(&self) -> &'static str {
        match self {
            DraftStyle::Markdown => "system_prompt.md.j2",
            DraftStyle::Xml => "system_prompt.xml.j2",
        }
    }
}

fn asset(name: &str) -> Result<&'static str, AppError> {
    DRAFTS_DIR
        .get_file(name)
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| AppError::config_error(format!("Missing embedded draft asset: {}", name)))
}

fn render(name: &str, subject: &str) -> Result<String, AppError> {
    let source = asset(name)?;

    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    env.render_str(source, context! { subject => subject }).map_err(|err| AppError::ParseError {
        what: format!("draft template {}", name),
        details: err.to_string(),
    })
}

/// Draft a system prompt for `subject`.
pub fn system_prompt_draft(subject: &str, style: DraftStyle) -> Result<String, AppError> {
    render(style.asset(), subject)
}

/// Draft a message template for `subject`, using `{title}` and
/// `{description}` placeholders.
pub fn message_template_draft(subject: &str) -> Result<String, AppError> {
    render("template.txt.j2", subject)
}

/// Workflow instructions shown by the `welcome` tool.
pub fn welcome_text() -> Result<&'static str, AppError> {
    asset("welcome.md")
}
