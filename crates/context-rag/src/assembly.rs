/// One chunk chosen for inclusion in an assembled context window, already
/// past dedup and reranking.
#[derive(Debug, Clone)]
pub struct AssemblyCandidate {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub score: f32,
}

/// A source as it appears in the final assembled block, with its 1-based
/// citation index.
#[derive(Debug, Clone)]
pub struct AssembledSource {
    pub citation: usize,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub score: f32,
}

/// Reorders best-first candidates so the strongest results sit at both
/// ends of the window — mitigates "lost in the middle" for callers that
/// weight the start and end of a context window more heavily.
pub fn sandwich_order(candidates: Vec<AssemblyCandidate>) -> Vec<AssemblyCandidate> {
    let mut front = Vec::new();
    let mut back = Vec::new();
    for (i, candidate) in candidates.into_iter().enumerate() {
        if i % 2 == 0 {
            front.push(candidate);
        } else {
            back.push(candidate);
        }
    }
    back.reverse();
    front.extend(back);
    front
}

/// Orders by file path then by starting line, ignoring score.
pub fn chronological_order(mut candidates: Vec<AssemblyCandidate>) -> Vec<AssemblyCandidate> {
    candidates.sort_by(|a, b| a.file.cmp(&b.file).then(a.start_line.cmp(&b.start_line)));
    candidates
}

fn approx_token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Drops trailing candidates (weakest-placed, since `sandwich_order` has
/// already moved the top results to both ends) until the remaining set
/// fits `token_budget`.
pub fn apply_token_budget(candidates: Vec<AssemblyCandidate>, token_budget: usize) -> Vec<AssemblyCandidate> {
    let mut kept = Vec::new();
    let mut used = 0usize;
    for candidate in candidates {
        let cost = approx_token_count(&candidate.content);
        if used + cost > token_budget && !kept.is_empty() {
            break;
        }
        used += cost;
        kept.push(candidate);
    }
    kept
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Assigns 1-based citation indices in final emission order and renders
/// the `<sources>` XML block.
pub fn assemble(candidates: Vec<AssemblyCandidate>) -> (String, Vec<AssembledSource>) {
    let sources: Vec<AssembledSource> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, c)| AssembledSource {
            citation: i + 1,
            file: c.file,
            start_line: c.start_line,
            end_line: c.end_line,
            content: c.content,
            score: c.score,
        })
        .collect();

    let mut xml = String::from("<sources>\n");
    for source in &sources {
        xml.push_str(&format!(
            "  <source id=\"{}\" file=\"{}\" location=\"lines {}-{}\">\n",
            source.citation,
            escape_xml(&source.file),
            source.start_line,
            source.end_line
        ));
        xml.push_str(&escape_xml(&source.content));
        xml.push_str("\n  </source>\n");
    }
    xml.push_str("</sources>");

    (xml, sources)
}
