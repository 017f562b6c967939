//! The account info page.
//!
//! The template is plain HTML with `{{ account }}` and `{{ referer }}`
//! placeholders. It is parsed once at startup and rendering HTML-escapes the
//! substituted values.

use std::fmt::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("unknown placeholder `{0}`")]
    UnknownPlaceholder(String),

    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),

    #[error("failed to render page: {0}")]
    Render(#[from] fmt::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Account,
    Referer,
}

/// Values substituted into the page.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub account: &'a str,
    pub referer: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageTemplate {
    segments: Vec<Segment>,
}

impl PageTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let inner = &rest[start + 2..];
            let end = inner
                .find("}}")
                .ok_or(TemplateError::Unterminated(offset + start))?;

            segments.push(match inner[..end].trim() {
                "account" => Segment::Account,
                "referer" => Segment::Referer,
                other => return Err(TemplateError::UnknownPlaceholder(other.to_string())),
            });

            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(PageTemplate { segments })
    }

    pub fn render(&self, context: &PageContext<'_>) -> Result<String, TemplateError> {
        let mut page = String::new();
        self.render_to(&mut page, context)?;
        Ok(page)
    }

    pub fn render_to<W: Write>(
        &self,
        out: &mut W,
        context: &PageContext<'_>,
    ) -> Result<(), TemplateError> {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.write_str(text)?,
                Segment::Account => write_escaped(out, context.account)?,
                Segment::Referer => write_escaped(out, context.referer)?,
            }
        }
        Ok(())
    }
}

fn write_escaped<W: Write>(out: &mut W, value: &str) -> fmt::Result {
    for c in value.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '"' => out.write_str("&#34;")?,
            '\'' => out.write_str("&#39;")?,
            _ => out.write_char(c)?,
        }
    }
    Ok(())
}
