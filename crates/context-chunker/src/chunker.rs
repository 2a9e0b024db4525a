use std::path::Path;

use tree_sitter::{Node, Parser};

use context_protocol::ContentType;

use crate::error::{ChunkerError, Result};
use crate::language::Language;

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Files with more lines than this are skipped rather than chunked.
    pub max_file_lines: usize,
    /// Syntactic chunks larger than this are split further by line window.
    pub max_chunk_lines: usize,
    /// Overlap, in lines, between consecutive semantic-chunker windows.
    pub overlap_lines: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_file_lines: 20_000,
            max_chunk_lines: 200,
            overlap_lines: 20,
        }
    }
}

/// One chunk of source text prior to embedding. `vector` is filled in by a
/// later pipeline stage once an `Embedder` has scored the content.
#[derive(Debug, Clone)]
pub struct ChunkPiece {
    pub relative_path: String,
    pub content: String,
    pub content_type: ContentType,
    pub language: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub symbol_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TooLarge,
    Empty,
    DecodeFailure,
}

#[derive(Debug, Default)]
pub struct ChunkResult {
    pub chunks: Vec<ChunkPiece>,
    pub skipped: Vec<(String, SkipReason)>,
}

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Chunks one file's content, dispatching to the syntactic (AST-aware)
    /// strategy when the language is supported, and to the semantic
    /// line-window strategy otherwise.
    pub fn chunk_file(&self, relative_path: &str, content: &str) -> ChunkResult {
        let mut result = ChunkResult::default();

        if content.trim().is_empty() {
            result
                .skipped
                .push((relative_path.to_string(), SkipReason::Empty));
            return result;
        }

        let line_count = content.lines().count();
        if line_count > self.config.max_file_lines {
            result
                .skipped
                .push((relative_path.to_string(), SkipReason::TooLarge));
            return result;
        }

        let language = Language::from_path(Path::new(relative_path));
        let content_type = classify(language);

        let chunks = if language.supports_ast() {
            match self.syntactic_chunk(relative_path, content, language) {
                Ok(chunks) if !chunks.is_empty() => chunks,
                _ => self.semantic_chunk(relative_path, content, language, content_type),
            }
        } else {
            self.semantic_chunk(relative_path, content, language, content_type)
        };

        result.chunks = chunks;
        result
    }

    fn syntactic_chunk(
        &self,
        relative_path: &str,
        content: &str,
        language: Language,
    ) -> Result<Vec<ChunkPiece>> {
        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|_| ChunkerError::ParseFailed)?;
        let tree = parser.parse(content, None).ok_or(ChunkerError::ParseFailed)?;

        let kinds = symbol_node_kinds(language);
        let mut pieces = Vec::new();
        let mut cursor = tree.walk();
        collect_symbol_nodes(&mut cursor, content.as_bytes(), kinds, &mut pieces);

        let content_type = classify(language);
        let mut chunks: Vec<ChunkPiece> = pieces
            .into_iter()
            .map(|(node, name)| {
                let start_line = node.start_position().row as u32 + 1;
                let end_line = node.end_position().row as u32 + 1;
                ChunkPiece {
                    relative_path: relative_path.to_string(),
                    content: content[node.start_byte()..node.end_byte()].to_string(),
                    content_type,
                    language: Some(language.as_str().to_string()),
                    start_line,
                    end_line,
                    symbol_name: name,
                }
            })
            .collect();

        chunks.sort_by_key(|c| c.start_line);
        Ok(chunks)
    }

    fn semantic_chunk(
        &self,
        relative_path: &str,
        content: &str,
        language: Language,
        content_type: ContentType,
    ) -> Vec<ChunkPiece> {
        let lines: Vec<&str> = content.lines().collect();
        if lines.is_empty() {
            return Vec::new();
        }

        let window = self.config.max_chunk_lines.max(1);
        let overlap = self.config.overlap_lines.min(window.saturating_sub(1));
        let stride = window - overlap;

        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < lines.len() {
            let end = (start + window).min(lines.len());
            let text = lines[start..end].join("\n");
            if !text.trim().is_empty() {
                chunks.push(ChunkPiece {
                    relative_path: relative_path.to_string(),
                    content: text,
                    content_type,
                    language: (language != Language::Unknown)
                        .then(|| language.as_str().to_string()),
                    start_line: start as u32 + 1,
                    end_line: end as u32,
                    symbol_name: None,
                });
            }
            if end == lines.len() {
                break;
            }
            start += stride;
        }
        chunks
    }
}

fn classify(language: Language) -> ContentType {
    match language {
        Language::Markdown => ContentType::Docs,
        Language::Yaml | Language::Json | Language::Config | Language::Terraform => {
            ContentType::Config
        }
        Language::Unknown => ContentType::Unknown,
        _ => ContentType::Code,
    }
}

fn symbol_node_kinds(language: Language) -> &'static [&'static str] {
    match language {
        Language::Rust => &[
            "function_item",
            "impl_item",
            "struct_item",
            "enum_item",
            "trait_item",
        ],
        Language::Python => &["function_definition", "class_definition"],
        Language::JavaScript | Language::TypeScript => &[
            "function_declaration",
            "class_declaration",
            "method_definition",
        ],
        _ => &[],
    }
}

fn collect_symbol_nodes<'a>(
    cursor: &mut tree_sitter::TreeCursor<'a>,
    source: &[u8],
    kinds: &[&str],
    out: &mut Vec<(Node<'a>, Option<String>)>,
) {
    let node = cursor.node();
    if kinds.contains(&node.kind()) {
        let name = node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
            .map(|s| s.to_string());
        out.push((node, name));
    }
    if cursor.goto_first_child() {
        loop {
            collect_symbol_nodes(cursor, source, kinds, out);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn syntactic_chunking_finds_rust_functions() {
        let chunker = Chunker::new(ChunkerConfig::default());
        let src = "fn alpha() {\n    1\n}\n\nfn beta() {\n    2\n}\n";
        let result = chunker.chunk_file("src/lib.rs", src);
        let names: Vec<_> = result
            .chunks
            .iter()
            .filter_map(|c| c.symbol_name.clone())
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn empty_file_is_skipped() {
        let chunker = Chunker::new(ChunkerConfig::default());
        let result = chunker.chunk_file("src/empty.rs", "   \n  \n");
        assert!(result.chunks.is_empty());
        assert_eq!(result.skipped, vec![("src/empty.rs".to_string(), SkipReason::Empty)]);
    }

    #[test]
    fn oversized_file_is_skipped() {
        let chunker = Chunker::new(ChunkerConfig {
            max_file_lines: 3,
            ..ChunkerConfig::default()
        });
        let result = chunker.chunk_file("src/big.rs", "a\nb\nc\nd\n");
        assert!(result.chunks.is_empty());
        assert_eq!(result.skipped[0].1, SkipReason::TooLarge);
    }

    #[test]
    fn markdown_falls_back_to_semantic_windowing() {
        let chunker = Chunker::new(ChunkerConfig {
            max_chunk_lines: 2,
            overlap_lines: 0,
            ..ChunkerConfig::default()
        });
        let result = chunker.chunk_file("README.md", "line one\nline two\nline three\nline four\n");
        assert_eq!(result.chunks.len(), 2);
        assert_eq!(result.chunks[0].content_type, ContentType::Docs);
    }
}
