//! Markdown rendering with syntax highlighting
//!
//! The pipeline runs over the pulldown-cmark event stream in a single pass:
//! GFM parsing, alert blockquotes, raw HTML removal, literal autolinks,
//! highlighted code blocks, mermaid diagrams and self-linking heading anchors.

use anyhow::Result;
use lazy_static::lazy_static;
use pulldown_cmark::{
    html, BlockQuoteKind, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag,
    TagEnd, TextMergeStream,
};
use regex::Regex;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{start_highlighted_html_snippet, styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::slugger::Slugger;
use crate::config::SiteConfig;
use crate::helpers::html_escape;

lazy_static! {
    static ref AUTOLINK: Regex = Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>]+").unwrap();
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
    allow_html: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", false, false)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool, allow_html: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            line_numbers,
            allow_html,
        }
    }

    /// Create from the site configuration
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::with_options(
            &config.highlight.theme,
            config.highlight.line_number,
            config.markdown.allow_html,
        )
    }

    /// Options that change the rendered output, for cache keys
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}:{}",
            self.theme_name, self.line_numbers, self.allow_html
        )
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String> {
        // Front-matter is handled separately in FrontMatter::parse()
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = TextMergeStream::new(Parser::new_ext(markdown, options));

        let mut pipeline = Pipeline::new(self);
        for event in parser {
            pipeline.handle(event);
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, pipeline.out.into_iter());

        Ok(html_output)
    }

    /// Render a fenced or indented code block
    fn render_code(&self, code: &str, lang: Option<&str>) -> String {
        match lang {
            Some("mermaid") => format!(r#"<div class="mermaid">{}</div>"#, html_escape(code)) + "\n",
            Some(lang) => self.highlight_code(code, lang),
            None => format!("<pre><code>{}</code></pre>\n", html_escape(code)),
        }
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let highlighted = self.theme().and_then(|theme| {
            let mut highlighter = HighlightLines::new(syntax, theme);
            let mut lines = Vec::new();
            for line in LinesWithEndings::from(code) {
                let regions = highlighter.highlight_line(line, &self.syntax_set).ok()?;
                lines.push(styled_line_to_highlighted_html(&regions, IncludeBackground::No).ok()?);
            }
            let (pre_open, _) = start_highlighted_html_snippet(theme);
            Some((pre_open, lines))
        });

        match highlighted {
            Some((pre_open, lines)) if self.line_numbers => {
                self.add_line_numbers(&pre_open, &lines, lang)
            }
            Some((pre_open, lines)) => format!(
                r#"<figure class="highlight {lang}">{pre}<code class="language-{lang}">{code}</code></pre></figure>"#,
                lang = html_escape(lang),
                pre = pre_open.trim_end(),
                code = lines.concat(),
            ) + "\n",
            None => {
                // Fallback to plain code block
                format!(
                    r#"<pre><code class="language-{}">{}</code></pre>"#,
                    html_escape(lang),
                    html_escape(code)
                ) + "\n"
            }
        }
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, pre_open: &str, lines: &[String], lang: &str) -> String {
        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");
        let code_lines = lines.concat();

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}{}</pre></td></tr></table></figure>"#,
            html_escape(lang),
            gutter,
            pre_open.trim_end(),
            code_lines.trim_end_matches('\n')
        ) + "\n"
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Heading being collected until its end tag
struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<String>,
    classes: Vec<String>,
    text: String,
    events: Vec<Event<'a>>,
}

/// Code block being collected until its end tag
struct PendingCode {
    lang: Option<String>,
    source: String,
}

/// Event rewriting state for one document
struct Pipeline<'a, 'r> {
    renderer: &'r MarkdownRenderer,
    slugger: Slugger,
    out: Vec<Event<'a>>,
    heading: Option<PendingHeading<'a>>,
    code: Option<PendingCode>,
    /// One entry per open blockquote: true when rendered as an alert
    quotes: Vec<bool>,
    /// Open links and images; no autolinks inside them
    link_depth: usize,
}

impl<'a, 'r> Pipeline<'a, 'r> {
    fn new(renderer: &'r MarkdownRenderer) -> Self {
        Self {
            renderer,
            slugger: Slugger::new(),
            out: Vec::new(),
            heading: None,
            code: None,
            quotes: Vec::new(),
            link_depth: 0,
        }
    }

    fn push(&mut self, event: Event<'a>) {
        match self.heading.as_mut() {
            Some(heading) => heading.events.push(event),
            None => self.out.push(event),
        }
    }

    fn push_html(&mut self, html: String) {
        self.push(Event::Html(CowStr::from(html)));
    }

    fn handle(&mut self, event: Event<'a>) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_string()),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(PendingCode {
                    lang,
                    source: String::new(),
                });
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(code) = self.code.take() {
                    let html = self.renderer.render_code(&code.source, code.lang.as_deref());
                    self.push_html(html);
                }
            }
            Event::Text(text) if self.code.is_some() => {
                if let Some(code) = self.code.as_mut() {
                    code.source.push_str(&text);
                }
            }

            Event::Start(Tag::Heading {
                level, id, classes, ..
            }) => {
                self.heading = Some(PendingHeading {
                    level,
                    id: id.map(|id| id.to_string()),
                    classes: classes.iter().map(|c| c.to_string()).collect(),
                    text: String::new(),
                    events: Vec::new(),
                });
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = self.heading.take() {
                    let html = self.finish_heading(heading);
                    self.out.push(Event::Html(CowStr::from(html)));
                }
            }

            Event::Start(Tag::BlockQuote(Some(kind))) => {
                self.quotes.push(true);
                self.push_html(alert_open(kind));
            }
            Event::Start(Tag::BlockQuote(None)) => {
                self.quotes.push(false);
                self.push(Event::Start(Tag::BlockQuote(None)));
            }
            Event::End(TagEnd::BlockQuote(kind)) => {
                if self.quotes.pop() == Some(true) {
                    self.push_html("</div>\n".to_string());
                } else {
                    self.push(Event::End(TagEnd::BlockQuote(kind)));
                }
            }

            Event::Start(tag @ (Tag::Link { .. } | Tag::Image { .. })) => {
                self.link_depth += 1;
                self.push(Event::Start(tag));
            }
            Event::End(end @ (TagEnd::Link | TagEnd::Image)) => {
                self.link_depth = self.link_depth.saturating_sub(1);
                self.push(Event::End(end));
            }

            Event::Html(_) | Event::InlineHtml(_) if !self.renderer.allow_html => {
                tracing::trace!("Dropping raw HTML from markdown");
            }
            Event::Start(Tag::HtmlBlock) | Event::End(TagEnd::HtmlBlock)
                if !self.renderer.allow_html => {}

            Event::Text(text) => {
                if let Some(heading) = self.heading.as_mut() {
                    heading.text.push_str(&text);
                }
                if self.link_depth == 0 && self.heading.is_none() {
                    self.push_autolinked(text);
                } else {
                    self.push(Event::Text(text));
                }
            }
            Event::Code(code) => {
                if let Some(heading) = self.heading.as_mut() {
                    heading.text.push_str(&code);
                }
                self.push(Event::Code(code));
            }

            other => self.push(other),
        }
    }

    /// Turn bare URLs in a text run into anchors
    fn push_autolinked(&mut self, text: CowStr<'a>) {
        if !AUTOLINK.is_match(&text) {
            self.push(Event::Text(text));
            return;
        }

        let source: &str = &text;
        let mut last = 0;
        for m in AUTOLINK.find_iter(source) {
            let url = trim_url(m.as_str());
            if url.is_empty() {
                continue;
            }
            if m.start() > last {
                self.push(Event::Text(CowStr::from(source[last..m.start()].to_string())));
            }
            let href = if url.to_ascii_lowercase().starts_with("www.") {
                format!("http://{}", url)
            } else {
                url.to_string()
            };
            self.push_html(format!(
                r#"<a href="{}">{}</a>"#,
                html_escape(&href),
                html_escape(url)
            ));
            last = m.start() + url.len();
        }
        if last < source.len() {
            self.push(Event::Text(CowStr::from(source[last..].to_string())));
        }
    }

    /// Render a collected heading with an id and a self-link
    fn finish_heading(&mut self, heading: PendingHeading<'a>) -> String {
        let level = heading.level as usize;
        let id = heading
            .id
            .unwrap_or_else(|| self.slugger.slug(heading.text.trim()));

        let has_link = heading
            .events
            .iter()
            .any(|event| matches!(event, Event::Start(Tag::Link { .. })));
        let mut inner = String::new();
        html::push_html(&mut inner, heading.events.into_iter());

        let class = if heading.classes.is_empty() {
            String::new()
        } else {
            format!(r#" class="{}""#, html_escape(&heading.classes.join(" ")))
        };

        if id.is_empty() {
            return format!("<h{level}{class}>{inner}</h{level}>\n");
        }

        let id = html_escape(&id);
        // Anchors cannot nest, so linked headings get a separate marker
        if has_link {
            return format!(
                r##"<h{level} id="{id}"{class}><a class="heading-anchor" href="#{id}" aria-hidden="true">#</a>{inner}</h{level}>"##
            ) + "\n";
        }
        format!(r##"<h{level} id="{id}"{class}><a href="#{id}">{inner}</a></h{level}>"##) + "\n"
    }
}

/// Opening markup for a GitHub alert blockquote
fn alert_open(kind: BlockQuoteKind) -> String {
    let (class, title) = match kind {
        BlockQuoteKind::Note => ("note", "Note"),
        BlockQuoteKind::Tip => ("tip", "Tip"),
        BlockQuoteKind::Important => ("important", "Important"),
        BlockQuoteKind::Warning => ("warning", "Warning"),
        BlockQuoteKind::Caution => ("caution", "Caution"),
    };
    format!(
        r#"<div class="markdown-alert markdown-alert-{}"><p class="markdown-alert-title">{}</p>"#,
        class, title
    ) + "\n"
}

/// Strip trailing punctuation that is not part of a literal URL
fn trim_url(url: &str) -> &str {
    let mut end = url.len();
    while let Some(c) = url[..end].chars().last() {
        let strip = match c {
            '.' | ',' | ':' | ';' | '!' | '?' | '"' | '\'' | '*' | '_' | '~' => true,
            ')' => url[..end].matches('(').count() < url[..end].matches(')').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        end -= c.len_utf8();
    }
    &url[..end]
}
