// Text extraction from uploaded PDF documents.
use pdf_extract::extract_text_from_mem;
use tracing::warn;

/// One uploaded document, held in memory for the duration of a run.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub data: Vec<u8>,
}

/// Concatenates the extracted text of every readable document, newline
/// separated, preserving upload order. A document that fails to parse
/// contributes nothing and is logged; the rest of the batch is unaffected.
/// Never returns an error: zero readable documents yield an empty string.
pub fn extract_corpus(documents: &[UploadedDocument]) -> String {
    let mut combined = String::new();
    for document in documents {
        match extract_text_from_mem(&document.data) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    combined.push_str(text);
                    combined.push('\n');
                }
            }
            Err(err) => {
                warn!(document = %document.name, "pdf parse failed, skipping: {err}");
            }
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_yields_empty_text() {
        assert_eq!(extract_corpus(&[]), "");
    }

    #[test]
    fn unreadable_document_contributes_nothing() {
        let documents = vec![
            UploadedDocument {
                name: "broken.pdf".to_string(),
                data: b"not a pdf at all".to_vec(),
            },
            UploadedDocument {
                name: "empty.pdf".to_string(),
                data: Vec::new(),
            },
        ];
        assert_eq!(extract_corpus(&documents), "");
    }
}
