//! Typed rich-text document tree and its translation transformer.
//!
//! The editor's wire format tags every node with a `type` field; this module
//! models the node kinds the CMS actually emits as a closed tagged union.
//! The transformer replaces text leaves (and an embedded block's
//! `content`/`caption` strings) in place. It never adds, drops, or reorders
//! nodes, and every non-text attribute passes through untouched.

use crate::i18n::Locale;
use crate::translator::{Translate, TranslateError};
use futures::future::{try_join_all, BoxFuture};
use serde::{Deserialize, Serialize};

/// A rich-text field value: the tree under the document's `root` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    pub root: Node,
}

/// Sub-fields carried by an embedded block node (banner, code, media embed).
/// Only `content` and `caption` are translatable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockFields {
    #[serde(rename = "blockType")]
    pub block_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// One node of the rich-text tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Root {
        #[serde(default)]
        children: Vec<Node>,
    },
    Paragraph {
        #[serde(default)]
        children: Vec<Node>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    Heading {
        /// Heading level tag ("h1".."h6")
        tag: String,
        #[serde(default)]
        children: Vec<Node>,
    },
    Quote {
        #[serde(default)]
        children: Vec<Node>,
    },
    Link {
        url: String,
        #[serde(default)]
        children: Vec<Node>,
    },
    Text {
        text: String,
        /// Formatting bitmask (bold, italic, ...) passed through verbatim
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<u32>,
    },
    Linebreak,
    Upload {
        /// Media document reference, never rewritten by translation
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<u64>,
        #[serde(default, rename = "relationTo", skip_serializing_if = "Option::is_none")]
        relation_to: Option<String>,
    },
    Block {
        fields: BlockFields,
    },
}

impl Node {
    /// Total number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self
            .children()
            .map(|children| children.iter().map(Node::count).sum())
            .unwrap_or(0)
    }

    /// Depth of this subtree (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .and_then(|children| children.iter().map(Node::depth).max())
            .unwrap_or(0)
    }

    fn children(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Root { children }
            | Node::Paragraph { children, .. }
            | Node::Heading { children, .. }
            | Node::Quote { children }
            | Node::Link { children, .. } => Some(children),
            Node::Text { .. } | Node::Linebreak | Node::Upload { .. } | Node::Block { .. } => None,
        }
    }
}

/// Translate a whole rich-text field.
///
/// Any leaf failure fails the field; the fanout then omits this one field
/// from the locale's update payload.
pub async fn translate_rich_text<T: Translate + ?Sized>(
    rich_text: &RichText,
    translator: &T,
    target: Locale,
) -> Result<RichText, TranslateError> {
    Ok(RichText {
        root: translate_node(&rich_text.root, translator, target).await?,
    })
}

/// Recursive-descent transformer over the node tree.
///
/// Boxed because async recursion needs an indirection point. Sibling
/// children carry no ordering dependency, so they translate concurrently;
/// result order follows input order regardless.
pub fn translate_node<'a, T: Translate + ?Sized>(
    node: &'a Node,
    translator: &'a T,
    target: Locale,
) -> BoxFuture<'a, Result<Node, TranslateError>> {
    Box::pin(async move {
        match node {
            Node::Text { text, format } => {
                // Empty leaves are carried over, not sent to the translator
                if text.trim().is_empty() {
                    return Ok(node.clone());
                }
                Ok(Node::Text {
                    text: translator.translate(text, target).await?,
                    format: *format,
                })
            }
            Node::Root { children } => Ok(Node::Root {
                children: translate_children(children, translator, target).await?,
            }),
            Node::Paragraph { children, format } => Ok(Node::Paragraph {
                children: translate_children(children, translator, target).await?,
                format: format.clone(),
            }),
            Node::Heading { tag, children } => Ok(Node::Heading {
                tag: tag.clone(),
                children: translate_children(children, translator, target).await?,
            }),
            Node::Quote { children } => Ok(Node::Quote {
                children: translate_children(children, translator, target).await?,
            }),
            Node::Link { url, children } => Ok(Node::Link {
                url: url.clone(),
                children: translate_children(children, translator, target).await?,
            }),
            Node::Linebreak => Ok(Node::Linebreak),
            Node::Upload { .. } => Ok(node.clone()),
            Node::Block { fields } => {
                let mut translated = fields.clone();
                if let Some(content) = fields.content.as_deref().filter(|c| !c.trim().is_empty()) {
                    translated.content = Some(translator.translate(content, target).await?);
                }
                if let Some(caption) = fields.caption.as_deref().filter(|c| !c.trim().is_empty()) {
                    translated.caption = Some(translator.translate(caption, target).await?);
                }
                Ok(Node::Block { fields: translated })
            }
        }
    })
}

async fn translate_children<'a, T: Translate + ?Sized>(
    children: &'a [Node],
    translator: &'a T,
    target: Locale,
) -> Result<Vec<Node>, TranslateError> {
    try_join_all(
        children
            .iter()
            .map(|child| translate_node(child, translator, target)),
    )
    .await
}
