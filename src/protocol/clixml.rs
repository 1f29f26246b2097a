//! Cleanup of PowerShell CLIXML error records found on stderr.

use roxmltree::Document;

use super::namespaces::{namespace, NSP_POWERSHELL};

/// Header PowerShell writes in front of serialized error records.
pub const CLIXML_HEADER: &[u8] = b"#< CLIXML\r\n";

/// Token PowerShell uses for a CRLF inside a serialized string.
const CRLF_TOKEN: &str = "_x000D__x000A_";

/// Turn CLIXML-encoded stderr into plain text.
///
/// Input without the header is returned unchanged, and so is input whose
/// XML part does not parse.
pub fn clean_stderr(bytes: &[u8]) -> Vec<u8> {
    let Some(xml) = bytes.strip_prefix(CLIXML_HEADER) else {
        return bytes.to_vec();
    };
    let Ok(xml) = std::str::from_utf8(xml) else {
        return bytes.to_vec();
    };
    let Ok(doc) = Document::parse(xml) else {
        return bytes.to_vec();
    };

    let ns = namespace(NSP_POWERSHELL);
    let mut out = String::new();
    for node in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "S" && n.tag_name().namespace() == ns)
    {
        for text in node
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
        {
            out.push_str(&text.replace(CRLF_TOKEN, "\n"));
        }
    }
    out.into_bytes()
}
