use std::collections::HashMap;
use std::path::Path;

use anyhow::{Result, anyhow};
use epub::doc::EpubDoc;
use html_escape::decode_html_entities;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::types::Section;

/// Bibliographic metadata lifted from the container's DC entries.
#[derive(Debug, Clone)]
pub struct BookMeta {
    pub title: String,
    pub author: Option<String>,
    pub language: Option<String>,
    pub metadata_json: String,
}

/// One document flattened to its linear reading order.
#[derive(Debug, Clone)]
pub struct FlattenedDoc {
    pub meta: BookMeta,
    pub sections: Vec<Section>,
}

impl FlattenedDoc {
    /// The whole reading order as one text blob, section texts joined by
    /// single newlines, in spine order.
    pub fn flattened_text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Extract title from HTML content: the `<title>` tag text, taking only the
/// part before the first '|' separator. Returns None for empty or
/// "Untitled" titles.
fn extract_html_title(content_bytes: &[u8]) -> Option<String> {
    lazy_static! {
        static ref TITLE_RE: Regex = Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").unwrap();
    }

    let content = String::from_utf8_lossy(content_bytes);

    let caps = TITLE_RE.captures(&content)?;
    let title = caps.get(1)?.as_str().trim();
    let title_part = title.split('|').next().unwrap_or(title).trim();

    if title_part.is_empty() || title_part.eq_ignore_ascii_case("untitled") {
        return None;
    }

    Some(decode_html_entities(title_part).to_string())
}

/// Strip markup from one section, keeping block boundaries as newlines so
/// that digit-led verse lines stay on lines of their own.
pub fn section_plain_text(html: &str) -> String {
    lazy_static! {
        static ref RE_DOCTYPE: Regex = Regex::new(r"(?is)<!doctype[^>]*>").unwrap();
        static ref RE_HEAD: Regex = Regex::new(r"(?is)<head.*?</head>").unwrap();
        static ref RE_STYLE: Regex = Regex::new(r"(?is)<style.*?</style>").unwrap();
        static ref RE_SCRIPT: Regex = Regex::new(r"(?is)<script.*?</script>").unwrap();
        static ref RE_COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
        static ref RE_BLOCK_BREAK: Regex =
            Regex::new(r"(?i)</(?:p|div|h[1-6]|li|tr|blockquote|table)\s*>|<br\s*/?>").unwrap();
        static ref RE_TAG: Regex = Regex::new(r"</*\w[^>]*>").unwrap();
        static ref RE_SPACES: Regex = Regex::new(r"[ \t]{2,}").unwrap();
    }

    let mut s = RE_DOCTYPE.replace_all(html, "").to_string();
    s = RE_HEAD.replace_all(&s, "").to_string();
    s = RE_STYLE.replace_all(&s, "").to_string();
    s = RE_SCRIPT.replace_all(&s, "").to_string();
    s = RE_COMMENT.replace_all(&s, "").to_string();
    // Closing block tags become line breaks before the remaining markup is
    // dropped, mirroring the reading order of the rendered page.
    s = RE_BLOCK_BREAK.replace_all(&s, "\n").to_string();
    s = RE_TAG.replace_all(&s, "").to_string();
    s = decode_html_entities(&s).to_string();
    s = RE_SPACES.replace_all(&s, " ").to_string();

    // Re-join trimmed, non-empty lines.
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flatten an EPUB into its ordered textual sections plus metadata.
///
/// The spine defines the reading order. A spine item whose resource cannot
/// be located is skipped silently rather than treated as an error; the
/// segmentation stage tolerates the gap. The relative order of the
/// remaining sections is preserved as-is.
pub fn flatten_epub(epub_path: &Path) -> Result<FlattenedDoc> {
    info!("Flattening EPUB {:?}", epub_path);

    let mut doc = EpubDoc::new(epub_path)
        .map_err(|e| anyhow!("Failed to open EPUB file {:?}: {}", epub_path, e))?;

    let title = doc
        .mdata("title")
        .or_else(|| doc.mdata("dc:title"))
        .map(|item| item.value.clone())
        .unwrap_or_else(|| "Untitled".to_string());

    let author = doc
        .mdata("creator")
        .or_else(|| doc.mdata("dc:creator"))
        .map(|item| item.value.clone())
        .filter(|s| !s.is_empty());

    let language = doc
        .mdata("language")
        .or_else(|| doc.mdata("dc:language"))
        .map(|item| item.value.clone())
        .filter(|s| !s.is_empty());

    let mut metadata_items = Vec::new();
    for item in &doc.metadata {
        metadata_items.push(serde_json::json!({
            "key": &item.property,
            "value": &item.value
        }));
    }
    let metadata_json = serde_json::to_string(&metadata_items)?;

    // Map resource paths to chapter titles from the table of contents.
    let mut toc_map: HashMap<String, String> = HashMap::new();
    for nav_point in doc.toc.iter() {
        if let Some(content_path) = nav_point.content.to_str() {
            // Drop any fragment identifier ("ch1.xhtml#s2" -> "ch1.xhtml").
            let path = content_path.split('#').next().unwrap_or(content_path);
            toc_map.insert(path.to_string(), nav_point.label.clone());
        }
    }

    // Spine items whose idref resolves to no resource are dropped here,
    // which is the missing-fragment policy: a gap, not an error.
    let spine_refs: Vec<(usize, String, String)> = doc
        .spine
        .iter()
        .enumerate()
        .filter_map(|(idx, spine_item)| {
            let resource_item = doc.resources.get(&spine_item.idref)?;
            let resource_path = resource_item.path.to_str()?;
            Some((idx, spine_item.idref.clone(), resource_path.to_string()))
        })
        .collect();

    let spine_len = spine_refs.len();
    let mut sections = Vec::with_capacity(spine_len);

    for (idx, idref, resource_path) in spine_refs {
        let Some((content_bytes, _mime)) = doc.get_resource(&idref) else {
            debug!("spine item {} has no readable content, skipping", idx);
            continue;
        };

        let section_title = toc_map
            .get(&resource_path)
            .cloned()
            .or_else(|| extract_html_title(&content_bytes))
            .unwrap_or_else(|| "Untitled".to_string());

        let html = String::from_utf8_lossy(&content_bytes);
        let text = section_plain_text(&html);

        debug!("spine item {}/{}: {} ({} chars)", idx + 1, spine_len, resource_path, text.len());
        sections.push(Section { title: section_title, text });
    }

    info!("Flattened {:?}: {} sections, title {:?}", epub_path, sections.len(), title);

    Ok(FlattenedDoc {
        meta: BookMeta { title, author, language, metadata_json },
        sections,
    })
}
