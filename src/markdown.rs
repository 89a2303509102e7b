//! Minimal line-based block parser for machine-authored markdown blocks.
//!
//! Only custom block types registered as [`BlockRule`]s are recognized; all
//! other markdown is treated as opaque text. Parsed [`Block`]s keep byte
//! ranges into the source so callers can extract or splice their content
//! without touching surrounding text.
use log::*;
use std::ops::Range;

pub mod section;

pub use section::SectionRule;

/// A block rule matched an opening marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    /// Name carried by the opening marker.
    pub name: String,
    /// Bytes of the fragment consumed by the opening marker.
    pub len: usize,
}

/// A block rule matched the closing marker of an open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed {
    /// Offset in the fragment where the closing marker begins.
    pub start: usize,
    /// Offset in the fragment just past the closing marker.
    pub end: usize,
}

/// Pluggable block grammar rule.
///
/// A rule decides whether a fragment opens a block of its kind and whether
/// a fragment closes an open block. Any fragment that does not close an
/// open block continues it.
pub trait BlockRule: Send + Sync {
    /// Kind recorded on blocks opened by this rule.
    fn kind(&self) -> &'static str;

    /// Rules with a higher priority get the first chance to open a block.
    fn priority(&self) -> u16;

    /// Returns `Some` when `fragment` starts with an opening marker.
    fn open(&self, fragment: &str) -> Option<Opened>;

    /// Returns `Some` when `fragment` contains the closing marker for the
    /// open block called `name`.
    fn close(&self, name: &str, fragment: &str) -> Option<Closed>;
}

/// A parsed block and its location in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: &'static str,
    pub name: String,
    /// Whole block including its markers.
    pub span: Range<usize>,
    /// Text between the markers.
    pub content: Range<usize>,
    /// False when the source ended before the closing marker.
    pub closed: bool,
    pub children: Vec<Block>,
}

impl Block {
    /// Raw text between the markers.
    pub fn content<'a>(&self, source: &'a str) -> &'a str {
        &source[self.content.clone()]
    }

    /// Depth-first search for a block of `kind` called `name`, starting
    /// with this block itself.
    pub fn find(&self, kind: &str, name: &str) -> Option<&Block> {
        if self.kind == kind && self.name == name {
            return Some(self);
        }

        self.children.iter().find_map(|c| c.find(kind, name))
    }
}

struct OpenBlock {
    rule: usize,
    block: Block,
}

/// Parses source text with a prioritized set of block rules.
pub struct BlockParser {
    rules: Vec<Box<dyn BlockRule>>,
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new().with_rule(SectionRule)
    }
}

impl BlockParser {
    /// A parser with no rules registered.
    pub fn new() -> Self {
        Self { rules: vec![] }
    }

    /// Register `rule`, keeping rules ordered by descending priority.
    pub fn with_rule(mut self, rule: impl BlockRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self.rules.sort_by_key(|r| std::cmp::Reverse(r.priority()));
        self
    }

    fn try_open(&self, fragment: &str) -> Option<(usize, Opened)> {
        self.rules
            .iter()
            .enumerate()
            .find_map(|(i, rule)| rule.open(fragment).map(|o| (i, o)))
    }

    /// Find the open block whose closing marker comes first in `fragment`,
    /// returning its index in `stack` and the marker location. Markers at
    /// the same offset go to the innermost block.
    fn try_close(
        &self,
        stack: &[OpenBlock],
        fragment: &str,
    ) -> Option<(usize, Closed)> {
        stack
            .iter()
            .enumerate()
            .filter_map(|(i, open)| {
                self.rules[open.rule]
                    .close(&open.block.name, fragment)
                    .map(|c| (i, c))
            })
            .min_by_key(|(i, c)| (c.start, std::cmp::Reverse(*i)))
    }

    /// Parse `source` into its top-level blocks.
    pub fn parse(&self, source: &str) -> Vec<Block> {
        let mut roots = vec![];
        let mut stack: Vec<OpenBlock> = vec![];
        let mut line_start = 0;

        for line in source.split_inclusive('\n') {
            let mut pos = 0;

            while pos < line.len() {
                let fragment = &line[pos..];
                let offset = line_start + pos;

                if let Some((rule, opened)) = self.try_open(fragment) {
                    let content_start = offset + opened.len;
                    stack.push(OpenBlock {
                        rule,
                        block: Block {
                            kind: self.rules[rule].kind(),
                            name: opened.name,
                            span: offset..content_start,
                            content: content_start..content_start,
                            closed: false,
                            children: vec![],
                        },
                    });
                    pos += opened.len;
                    continue;
                }

                if let Some((depth, closed)) = self.try_close(&stack, fragment)
                {
                    let content_end = offset + closed.start;
                    let span_end = offset + closed.end;

                    // closing a block also closes everything nested in it
                    while stack.len() > depth {
                        let Some(mut open) = stack.pop() else { break };
                        open.block.content.end = content_end;
                        open.block.span.end = span_end;
                        open.block.closed = stack.len() == depth;
                        attach(&mut stack, &mut roots, open.block);
                    }

                    pos += closed.end;
                    continue;
                }

                break;
            }

            line_start += line.len();
        }

        while let Some(mut open) = stack.pop() {
            debug!(
                "{} block '{}' not closed before end of input",
                open.block.kind, open.block.name
            );
            open.block.content.end = source.len();
            open.block.span.end = source.len();
            attach(&mut stack, &mut roots, open.block);
        }

        roots
    }
}

fn attach(stack: &mut [OpenBlock], roots: &mut Vec<Block>, block: Block) {
    match stack.last_mut() {
        Some(parent) => parent.block.children.push(block),
        None => roots.push(block),
    }
}

/// Find the first section called `name` anywhere in `blocks`.
pub fn find_section<'a>(blocks: &'a [Block], name: &str) -> Option<&'a Block> {
    blocks
        .iter()
        .find_map(|b| b.find(section::SECTION_KIND, name))
}

/// Trimmed content of the section called `name`, if present.
pub fn section_content<'a>(source: &'a str, name: &str) -> Option<&'a str> {
    let blocks = BlockParser::default().parse(source);
    find_section(&blocks, name).map(|b| b.content(source).trim())
}

/// Replace the content of the section called `name` with `body`, leaving
/// every byte outside the section untouched. Returns `None` when the
/// section does not exist.
pub fn replace_section(source: &str, name: &str, body: &str) -> Option<String> {
    let blocks = BlockParser::default().parse(source);
    let block = find_section(&blocks, name)?;

    let mut content = format!("\n{}\n", body.trim());
    if !block.closed {
        content.push_str(&section::end_marker(name));
        content.push('\n');
    }

    let mut updated = String::with_capacity(source.len() + content.len());
    updated.push_str(&source[..block.content.start]);
    updated.push_str(&content);
    updated.push_str(&source[block.content.end..]);

    Some(updated)
}
