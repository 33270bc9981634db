//! Markdown to document tree conversion using pulldown-cmark.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use serde_json::Value;

use crate::domain::{DocumentTree, NodeKind, TreeNode, TreeNodeId};

/// Options for markdown parsing
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Enable tables extension
    pub tables: bool,
    /// Enable strikethrough extension
    pub strikethrough: bool,
    /// Enable footnotes extension
    pub footnotes: bool,
    /// Enable task list extension
    pub task_lists: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            footnotes: true,
            task_lists: true,
        }
    }
}

impl MarkdownOptions {
    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        opts
    }
}

/// Parse markdown with the default options
pub fn parse(markdown: &str) -> DocumentTree {
    parse_with(markdown, &MarkdownOptions::default())
}

/// Parse markdown into a document tree
pub fn parse_with(markdown: &str, options: &MarkdownOptions) -> DocumentTree {
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(markdown, options.to_pulldown_options()) {
        builder.handle_event(event);
    }
    builder.tree
}

/// Event sink that grows a tree under a stack of open nodes
struct TreeBuilder {
    tree: DocumentTree,
    /// Open frames; `None` marks a tag swallowed inside an image
    stack: Vec<Option<TreeNodeId>>,
    /// Image currently collecting alt text
    image: Option<TreeNodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        let tree = DocumentTree::new();
        let root = tree.root();
        Self {
            tree,
            stack: vec![Some(root)],
            image: None,
        }
    }

    fn current(&self) -> TreeNodeId {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| *frame)
            .unwrap_or(TreeNodeId::ROOT)
    }

    fn current_kind(&self) -> Option<NodeKind> {
        self.tree.node(self.current()).map(|n| n.kind)
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(_) => self.end_tag(),
            Event::Text(text) => self.add_text(text.as_ref()),
            Event::Code(code) => {
                self.add_leaf(TreeNode::new(NodeKind::InlineCode).with_value(code.to_string()))
            }
            Event::Html(html) | Event::InlineHtml(html) => self.add_html(html.as_ref()),
            Event::SoftBreak => self.add_text("\n"),
            Event::HardBreak => self.add_leaf(TreeNode::new(NodeKind::Break)),
            Event::Rule => self.add_leaf(TreeNode::new(NodeKind::ThematicBreak)),
            Event::FootnoteReference(label) => {
                self.add_leaf(footnote_node("footnoteReference", label.as_ref()))
            }
            Event::TaskListMarker(checked) => self.mark_task(checked),
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        if self.image.is_some() {
            self.stack.push(None);
            return;
        }

        let node = match tag {
            Tag::Paragraph => TreeNode::new(NodeKind::Paragraph),
            Tag::Heading { level, .. } => {
                TreeNode::new(NodeKind::Heading).with_depth(heading_depth(level))
            }
            Tag::BlockQuote(_) => TreeNode::new(NodeKind::Blockquote),
            Tag::CodeBlock(kind) => {
                let node = TreeNode::new(NodeKind::Code).with_value("");
                match kind {
                    CodeBlockKind::Fenced(info) => with_info_string(node, info.as_ref()),
                    CodeBlockKind::Indented => node,
                }
            }
            Tag::HtmlBlock => TreeNode::new(NodeKind::Html).with_value(""),
            Tag::List(start) => {
                let node = TreeNode::new(NodeKind::List).with_extra("ordered", start.is_some());
                match start {
                    Some(start) => node.with_extra("start", start),
                    None => node,
                }
            }
            Tag::Item => TreeNode::new(NodeKind::ListItem),
            Tag::Table(aligns) => {
                let align: Vec<Value> = aligns.iter().map(alignment).collect();
                TreeNode::new(NodeKind::Table).with_extra("align", align)
            }
            Tag::FootnoteDefinition(label) => footnote_node("footnoteDefinition", label.as_ref()),
            Tag::TableHead | Tag::TableRow => TreeNode::new(NodeKind::TableRow),
            Tag::TableCell => TreeNode::new(NodeKind::TableCell),
            Tag::Emphasis => TreeNode::new(NodeKind::Emphasis),
            Tag::Strong => TreeNode::new(NodeKind::Strong),
            Tag::Strikethrough => TreeNode::new(NodeKind::Delete),
            Tag::Link { dest_url, title, .. } => {
                let node = TreeNode::new(NodeKind::Link).with_url(dest_url.to_string());
                with_title(node, title.as_ref())
            }
            Tag::Image { dest_url, title, .. } => {
                let node = TreeNode::image(dest_url.to_string()).with_alt("");
                with_title(node, title.as_ref())
            }
            _ => TreeNode::new(NodeKind::Unknown),
        };

        let is_image = node.kind == NodeKind::Image;
        let parent = self.current();
        let id = self.tree.push(parent, node);
        if is_image {
            self.image = Some(id);
        }
        self.stack.push(Some(id));
    }

    fn end_tag(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(Some(id)) = self.stack.pop() {
            if self.image == Some(id) {
                self.image = None;
            }
        }
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        if let Some(image) = self.image {
            append_value(&mut self.tree, image, text, Field::Alt);
            return;
        }

        let current = self.current();
        if matches!(self.current_kind(), Some(NodeKind::Code | NodeKind::Html)) {
            append_value(&mut self.tree, current, text, Field::Value);
            return;
        }

        // Adjacent text runs merge into one node
        if let Some(&last) = self.tree.children(current).last() {
            if self.tree.node(last).is_some_and(|n| n.kind == NodeKind::Text) {
                append_value(&mut self.tree, last, text, Field::Value);
                return;
            }
        }
        self.tree.push(current, TreeNode::text(text));
    }

    fn add_html(&mut self, html: &str) {
        if self.image.is_some() {
            return;
        }
        if self.current_kind() == Some(NodeKind::Html) {
            let current = self.current();
            append_value(&mut self.tree, current, html, Field::Value);
        } else {
            self.add_leaf(TreeNode::new(NodeKind::Html).with_value(html));
        }
    }

    fn mark_task(&mut self, checked: bool) {
        let item = self.stack.iter().rev().flatten().copied().find(|&id| {
            self.tree
                .node(id)
                .is_some_and(|n| n.kind == NodeKind::ListItem)
        });
        if let Some(node) = item.and_then(|id| self.tree.node_mut(id)) {
            node.extra.insert("checked".to_string(), Value::Bool(checked));
        }
    }

    fn add_leaf(&mut self, node: TreeNode) {
        if self.image.is_some() {
            return;
        }
        let parent = self.current();
        self.tree.push(parent, node);
    }
}

enum Field {
    Value,
    Alt,
}

fn append_value(tree: &mut DocumentTree, id: TreeNodeId, text: &str, field: Field) {
    if let Some(node) = tree.node_mut(id) {
        let slot = match field {
            Field::Value => &mut node.value,
            Field::Alt => &mut node.alt,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }
}

fn with_title(node: TreeNode, title: &str) -> TreeNode {
    if title.is_empty() {
        node
    } else {
        node.with_title(title)
    }
}

/// Split a fence info string into `lang` and `meta`
fn with_info_string(node: TreeNode, info: &str) -> TreeNode {
    let info = info.trim();
    if info.is_empty() {
        return node;
    }
    match info.split_once(char::is_whitespace) {
        Some((lang, meta)) => node.with_extra("lang", lang).with_extra("meta", meta.trim()),
        None => node.with_extra("lang", info),
    }
}

fn footnote_node(type_name: &str, label: &str) -> TreeNode {
    TreeNode::unknown(type_name)
        .with_extra("identifier", label.to_lowercase())
        .with_extra("label", label)
}

fn alignment(align: &Alignment) -> Value {
    match align {
        Alignment::None => Value::Null,
        Alignment::Left => Value::from("left"),
        Alignment::Center => Value::from("center"),
        Alignment::Right => Value::from("right"),
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
