//! Open XML namespace and relationship-type URIs.
//!
//! Based on ECMA-376 / ISO-IEC 29500 and the Microsoft Open XML SDK. These
//! are the canonical strings the schema and semantic layers compare Clark
//! notation names (`{namespace}local-name`) and `r:id`-style attributes
//! against.

/// Content Types namespace.
pub const CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

// Relationships namespaces
pub const RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const RELATIONSHIPS_METADATA_CORE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

// Office Document Relationships
pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
pub const REL_CUSTOM_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/custom-properties";
pub const REL_THUMBNAIL: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail";

// PresentationML namespaces
pub const PRESENTATIONML: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub const PRESENTATIONML_STRICT: &str = "http://purl.oclc.org/ooxml/presentationml/main";

/// WordprocessingML namespace.
pub const WORDPROCESSINGML: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// SpreadsheetML namespace.
pub const SPREADSHEETML: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

// PresentationML relationship types
pub const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub const REL_NOTES_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
pub const REL_NOTES_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
pub const REL_HANDOUT_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/handoutMaster";
pub const REL_THEME: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
pub const REL_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
pub const REL_VIEW_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
pub const REL_TABLE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
pub const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
pub const REL_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
pub const REL_COMMENTS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
pub const REL_FOOTNOTES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footnotes";
pub const REL_ENDNOTES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/endnotes";
pub const REL_CUSTOM_XML: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/customXml";
pub const REL_CUSTOM_XML_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/customXmlProps";
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub const REL_STYLES_WITH_EFFECTS: &str =
    "http://schemas.microsoft.com/office/2007/relationships/stylesWithEffects";
pub const REL_SETTINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
pub const REL_WEB_SETTINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/webSettings";
pub const REL_FONT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/font";
pub const REL_FONT_TABLE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/fontTable";
pub const REL_NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
pub const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
pub const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub const REL_CHARTSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chartsheet";
pub const REL_DIALOGSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/dialogsheet";
pub const REL_MACRO_SHEET: &str =
    "http://schemas.microsoft.com/office/2006/relationships/xlMacrosheet";

// DrawingML namespaces
pub const DRAWINGML: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const DRAWINGML_STRICT: &str = "http://purl.oclc.org/ooxml/drawingml/main";
pub const DRAWINGML_CHART: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
pub const DRAWINGML_DIAGRAM: &str = "http://schemas.openxmlformats.org/drawingml/2006/diagram";
pub const DRAWINGML_PICTURE: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub const DRAWINGML_SPREADSHEET: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
pub const DRAWINGML_WORDPROCESSING: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";

// Office Document namespaces
pub const OFFICE_DOC: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes";
pub const OFFICE_DOC_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const OFFICE_DOC_MATH: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";
pub const OFFICE_DOC_BIBLIOGRAPHY: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/bibliography";
pub const OFFICE_DOC_CUSTOM_XML: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/customXml";

// Core Properties (Dublin Core)
pub const CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const DCMITYPE: &str = "http://purl.org/dc/dcmitype/";
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

// Extended Properties (App)
pub const EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";

// VML (Vector Markup Language)
pub const VML: &str = "urn:schemas-microsoft-com:vml";
pub const VML_OFFICE: &str = "urn:schemas-microsoft-com:office:office";
pub const VML_WORD: &str = "urn:schemas-microsoft-com:office:word";
pub const VML_EXCEL: &str = "urn:schemas-microsoft-com:office:excel";
pub const VML_POWERPOINT: &str = "urn:schemas-microsoft-com:office:powerpoint";

/// Markup Compatibility namespace.
pub const MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";

// Microsoft Office extensions
pub const MS_OFFICE: &str = "http://schemas.microsoft.com/office/2006/metadata/properties";
pub const MS_OFFICE_WORD: &str = "http://schemas.microsoft.com/office/word/2006/wordml";
pub const MS_OFFICE_EXCEL: &str =
    "http://schemas.microsoft.com/office/spreadsheetml/2009/9/main";
pub const MS_OFFICE_DRAWING: &str = "http://schemas.microsoft.com/office/drawing/2010/main";
pub const MS_OFFICE_POWERPOINT: &str =
    "http://schemas.microsoft.com/office/powerpoint/2010/main";

// XML standard namespaces
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema";

/// Standard prefix -> namespace URI table, the Rust analogue of lxml's `nsmap`.
pub static NSMAP: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "ct" => CONTENT_TYPES,
    "r" => RELATIONSHIPS,
    "p" => PRESENTATIONML,
    "a" => DRAWINGML,
    "pic" => DRAWINGML_PICTURE,
    "c" => DRAWINGML_CHART,
    "dgm" => DRAWINGML_DIAGRAM,
    "mc" => MC,
    "v" => VML,
    "o" => VML_OFFICE,
    "w" => WORDPROCESSINGML,
    "x" => SPREADSHEETML,
    "wp" => DRAWINGML_WORDPROCESSING,
    "dc" => DC,
    "dcterms" => DCTERMS,
    "xsi" => XSI,
};

/// Look up the standard prefix for a namespace URI (the reverse of [`NSMAP`]).
///
/// `phf` only builds perfect-hash maps over the keys known at compile time,
/// so the reverse lookup is a linear scan over the (small, fixed) table
/// rather than a second generated map.
pub fn get_prefix(namespace: &str) -> Option<&'static str> {
    NSMAP
        .entries()
        .find(|(_, uri)| **uri == namespace)
        .map(|(prefix, _)| *prefix)
}

/// Build a Clark notation qualified name `{namespace}local_name`.
pub fn qualify_name(local_name: &str, namespace: &str) -> String {
    format!("{{{namespace}}}{local_name}")
}

/// Split a Clark notation name into `(namespace, local_name)`.
///
/// Returns `None` for the namespace when `qname` has no `{...}` prefix.
pub fn split_qualified_name(qname: &str) -> (Option<&str>, &str) {
    if let Some(rest) = qname.strip_prefix('{') {
        if let Some(end) = rest.find('}') {
            return (Some(&rest[..end]), &rest[end + 1..]);
        }
    }
    (None, qname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_and_split_round_trip() {
        let qname = qualify_name("sldId", PRESENTATIONML);
        assert_eq!(qname, format!("{{{PRESENTATIONML}}}sldId"));
        let (ns, local) = split_qualified_name(&qname);
        assert_eq!(ns, Some(PRESENTATIONML));
        assert_eq!(local, "sldId");
    }

    #[test]
    fn split_unqualified_name_has_no_namespace() {
        let (ns, local) = split_qualified_name("Relationship");
        assert_eq!(ns, None);
        assert_eq!(local, "Relationship");
    }

    #[test]
    fn get_prefix_known_namespace() {
        assert_eq!(get_prefix(WORDPROCESSINGML), Some("w"));
        assert_eq!(get_prefix("urn:does-not-exist"), None);
    }
}
