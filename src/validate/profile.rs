//! Document-kind detection and the per-kind structural walk (ECMA-376 §4.9).
//!
//! The main document part's content type (falling back to its path) decides
//! which profile runs; everything else in the pipeline is shared.

use std::collections::HashSet;

use crate::ooxml::namespaces::{
    REL_CUSTOM_XML, REL_CUSTOM_XML_PROPS, REL_ENDNOTES, REL_FONT_TABLE, REL_FOOTNOTES, REL_NUMBERING, REL_SETTINGS, REL_SHARED_STRINGS, REL_SLIDE,
    REL_SLIDE_MASTER, REL_STYLES, REL_STYLES_WITH_EFFECTS, REL_THEME, REL_WEB_SETTINGS, REL_WORKSHEET, SPREADSHEETML, WORDPROCESSINGML,
};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::Part;
use crate::ooxml::xmltree::{self, XmlNode};
use crate::validate::context::ValidationContext;
use crate::validate::error::{ErrorKind, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Presentation,
    Word,
    Spreadsheet,
    Unknown,
}

/// Detects document kind from the main part's content type, falling back to
/// its path when the content type is uninformative.
pub fn detect_document_kind(ctx: &ValidationContext) -> DocumentKind {
    let Ok(main) = ctx.package.main_document_part() else { return DocumentKind::Unknown };
    let content_type = main.content_type();
    let uri = main.partname().as_str().to_lowercase();
    if content_type.contains("presentationml") || uri.contains("/ppt/") {
        DocumentKind::Presentation
    } else if content_type.contains("wordprocessingml") || uri.contains("/word/") {
        DocumentKind::Word
    } else if content_type.contains("spreadsheetml") || uri.contains("/xl/") {
        DocumentKind::Spreadsheet
    } else {
        DocumentKind::Unknown
    }
}

/// Presentation structural walk: the main part must declare at least one
/// slide master, and every master/slide relationship must resolve to an
/// existing part.
pub fn validate_presentation_structure(ctx: &mut ValidationContext) {
    let Ok(main) = ctx.package.main_document_part() else { return };
    let main_uri = main.partname().as_str().to_string();
    ctx.enter_part(&main_uri);

    let Ok(root) = xmltree::parse(main.blob()) else {
        ctx.record(ErrorKind::Schema, Severity::Error, "Cannot parse presentation.xml");
        return;
    };

    let master_ids = relationship_ids_referenced(&root, "sldMasterId");
    if master_ids.is_empty() {
        ctx.record(ErrorKind::Schema, Severity::Error, "Presentation has no slide masters");
    }
    for r_id in &master_ids {
        check_relationship_target(ctx, &main_uri, r_id, "Slide master");
    }

    let slide_ids = relationship_ids_referenced(&root, "sldId");
    for r_id in &slide_ids {
        check_relationship_target(ctx, &main_uri, r_id, "Slide");
    }
}

/// Word structural walk: verify the main part parses, and (in strict mode)
/// that the standard set of companion parts is present with the content
/// type Office expects for each.
pub fn validate_word_structure(ctx: &mut ValidationContext) {
    let Ok(main) = ctx.package.main_document_part() else { return };
    let main_uri = main.partname().as_str().to_string();
    ctx.enter_part(&main_uri);

    if xmltree::parse(main.blob()).is_err() {
        ctx.record(ErrorKind::Schema, Severity::Error, "Cannot parse document.xml");
        return;
    }

    if !ctx.strict {
        return;
    }
    let required = [
        (REL_STYLES, "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"),
        (REL_STYLES_WITH_EFFECTS, "application/vnd.ms-word.stylesWithEffects+xml"),
        (REL_SETTINGS, "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"),
        (REL_WEB_SETTINGS, "application/vnd.openxmlformats-officedocument.wordprocessingml.webSettings+xml"),
        (REL_FONT_TABLE, "application/vnd.openxmlformats-officedocument.wordprocessingml.fontTable+xml"),
        (REL_NUMBERING, "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"),
        (REL_THEME, "application/vnd.openxmlformats-officedocument.theme+xml"),
    ];
    validate_required_relationships(ctx, &main_uri, &required);
}

/// Spreadsheet structural walk: main part parses, and (in strict mode) a
/// styles and theme part are present with the expected content types.
pub fn validate_spreadsheet_structure(ctx: &mut ValidationContext) {
    let Ok(main) = ctx.package.main_document_part() else { return };
    let main_uri = main.partname().as_str().to_string();
    ctx.enter_part(&main_uri);

    if xmltree::parse(main.blob()).is_err() {
        ctx.record(ErrorKind::Schema, Severity::Error, "Cannot parse workbook.xml");
        return;
    }

    if !ctx.strict {
        return;
    }
    let required = [
        (REL_STYLES, "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"),
        (REL_THEME, "application/vnd.openxmlformats-officedocument.theme+xml"),
    ];
    validate_required_relationships(ctx, &main_uri, &required);
}

fn validate_required_relationships(ctx: &mut ValidationContext, main_uri: &str, required: &[(&str, &str)]) {
    let Ok(packuri) = PackURI::new(main_uri.to_string()) else { return };
    let Ok(part) = ctx.package.get_part(&packuri) else { return };

    for (reltype, expected_content_type) in required {
        let Some(rel) = part.rels().iter().find(|r| r.reltype() == *reltype) else {
            let name = reltype.rsplit('/').next().unwrap_or(reltype);
            ctx.record(ErrorKind::Semantic, Severity::Error, format!("Missing required relationship type '{name}' ({reltype})"));
            continue;
        };
        if rel.is_external() {
            continue;
        }
        let Ok(target) = rel.target_partname() else { continue };
        if !ctx.package.contains_part(&target) {
            continue;
        }
        let Ok(target_part) = ctx.package.get_part(&target) else { continue };
        if target_part.content_type() != *expected_content_type {
            ctx.record(
                ErrorKind::Semantic,
                Severity::Error,
                format!("Relationship '{reltype}' target has unexpected content type '{}'", target_part.content_type()),
            );
        }
    }
}

/// Collects the relationship ids referenced by every `<local_name ... r:id="...">`
/// descendant, in document order. Used for `p:sldMasterId`/`p:sldId` lists,
/// each of which carries its relationship id as an `r:id` attribute.
fn relationship_ids_referenced(root: &xmltree::XmlNode, local_name: &str) -> Vec<String> {
    let mut out = Vec::new();
    for node in root.iter() {
        if node.local_name() != local_name {
            continue;
        }
        if let Some(r_id) = node.attr(&format!("{{{}}}id", crate::ooxml::namespaces::OFFICE_DOC_RELATIONSHIPS)) {
            out.push(r_id.to_string());
        }
    }
    out
}

fn check_relationship_target(ctx: &mut ValidationContext, main_uri: &str, r_id: &str, label: &str) {
    let Ok(packuri) = PackURI::new(main_uri.to_string()) else { return };
    let Ok(part) = ctx.package.get_part(&packuri) else { return };
    let Some(rel) = part.rels().get(r_id) else {
        ctx.record(ErrorKind::Relationship, Severity::Error, format!("{label} relationship {r_id} not found"));
        return;
    };
    if rel.is_external() {
        return;
    }
    match rel.target_partname() {
        Ok(target) if ctx.package.contains_part(&target) => {}
        Ok(target) => {
            ctx.record(ErrorKind::Package, Severity::Error, format!("{label} part not found: {}", target.as_str()));
        }
        Err(_) => {}
    }
}

/// Phase 7: profile-specific deep walk and cross-part wiring checks
/// (ECMA-376 §4.9 item (c)/(7)). Runs after schema and semantic validation
/// so the parts involved are already known to parse.
pub fn validate_cross_part_wiring(kind: DocumentKind, ctx: &mut ValidationContext) {
    match kind {
        DocumentKind::Presentation => validate_presentation_deep_walk(ctx),
        DocumentKind::Word => validate_word_cross_part_wiring(ctx),
        DocumentKind::Spreadsheet => validate_spreadsheet_shared_strings(ctx),
        DocumentKind::Unknown => {}
    }
}

/// Descends masters -> layouts -> themes -> slides: every slide master's
/// `p:sldLayoutId` list and every master/layout's theme relationship must
/// resolve to an existing part.
fn validate_presentation_deep_walk(ctx: &mut ValidationContext) {
    let Ok(main) = ctx.package.main_document_part() else { return };
    let main_uri = main.partname().as_str().to_string();
    let Ok(root) = xmltree::parse(main.blob()) else { return };

    for master_r_id in relationship_ids_referenced(&root, "sldMasterId") {
        let Some(master_uri) = resolve_relationship_uri(ctx, &main_uri, &master_r_id) else { continue };
        check_relationship_target(ctx, &main_uri, &master_r_id, "Slide master");
        validate_master_theme_and_layouts(ctx, &master_uri);
    }
}

fn validate_master_theme_and_layouts(ctx: &mut ValidationContext, master_uri: &str) {
    let Ok(packuri) = PackURI::new(master_uri.to_string()) else { return };
    let Ok(part) = ctx.package.get_part(&packuri) else { return };
    let Ok(root) = xmltree::parse(part.blob()) else { return };

    if part.rels().iter().find(|r| r.reltype() == REL_THEME).is_none() {
        ctx.enter_part(master_uri);
        ctx.record(ErrorKind::Semantic, Severity::Error, "Slide master has no theme relationship");
    }

    for layout_r_id in relationship_ids_referenced(&root, "sldLayoutId") {
        check_relationship_target(ctx, master_uri, &layout_r_id, "Slide layout");
    }
}

fn resolve_relationship_uri(ctx: &ValidationContext, source_uri: &str, r_id: &str) -> Option<String> {
    let packuri = PackURI::new(source_uri.to_string()).ok()?;
    let part = ctx.package.get_part(&packuri).ok()?;
    let rel = part.rels().get(r_id)?;
    if rel.is_external() {
        return None;
    }
    rel.target_partname().ok().map(|p| p.as_str().to_string())
}

/// Word cross-part wiring: style/numbering/custom-xml/footnote-endnote
/// references resolve against their owning part (§4.9 item (c)).
fn validate_word_cross_part_wiring(ctx: &mut ValidationContext) {
    let Ok(main) = ctx.package.main_document_part() else { return };
    let main_uri = main.partname().as_str().to_string();
    let Ok(doc_root) = xmltree::parse(main.blob()) else { return };

    validate_style_references(ctx, &main_uri, &doc_root, main.rels());
    validate_numbering_references(ctx, &main_uri, &doc_root, main.rels());
    validate_custom_xml_items(ctx, main.rels());
    validate_footnote_endnote_references(ctx, &main_uri, main.rels());
}

fn style_ids(root: &XmlNode) -> HashSet<String> {
    root.iter()
        .filter(|n| n.namespace() == Some(WORDPROCESSINGML) && n.local_name() == "style")
        .filter_map(|n| n.attr(&format!("{{{WORDPROCESSINGML}}}styleId")).map(str::to_string))
        .collect()
}

fn validate_style_references(ctx: &mut ValidationContext, main_uri: &str, doc_root: &XmlNode, main_rels: &crate::ooxml::opc::rel::Relationships) {
    let Some(rel) = main_rels.iter().find(|r| r.reltype() == REL_STYLES) else { return };
    if rel.is_external() {
        return;
    }
    let Ok(styles_uri) = rel.target_partname() else { return };
    let Ok(styles_part) = ctx.package.get_part(&styles_uri) else { return };
    let Ok(styles_root) = xmltree::parse(styles_part.blob()) else { return };
    let known = style_ids(&styles_root);

    ctx.enter_part(main_uri);
    const STYLE_REF_ELEMENTS: &[&str] = &["pStyle", "rStyle", "tblStyle", "numStyle"];
    for node in doc_root.iter() {
        if node.namespace() != Some(WORDPROCESSINGML) || !STYLE_REF_ELEMENTS.contains(&node.local_name()) {
            continue;
        }
        let Some(style_id) = node.attr(&format!("{{{WORDPROCESSINGML}}}val")) else { continue };
        if !known.contains(style_id) {
            ctx.record(ErrorKind::Semantic, Severity::Error, format!("Style '{style_id}' referenced by '{}' does not exist", node.local_name()));
        }
    }
}

fn validate_numbering_references(ctx: &mut ValidationContext, main_uri: &str, doc_root: &XmlNode, main_rels: &crate::ooxml::opc::rel::Relationships) {
    let Some(rel) = main_rels.iter().find(|r| r.reltype() == REL_NUMBERING) else { return };
    if rel.is_external() {
        return;
    }
    let Ok(numbering_uri) = rel.target_partname() else { return };
    let Ok(numbering_part) = ctx.package.get_part(&numbering_uri) else { return };
    let Ok(numbering_root) = xmltree::parse(numbering_part.blob()) else { return };

    let abstract_ids: HashSet<String> = numbering_root
        .iter()
        .filter(|n| n.namespace() == Some(WORDPROCESSINGML) && n.local_name() == "abstractNum")
        .filter_map(|n| n.attr(&format!("{{{WORDPROCESSINGML}}}abstractNumId")).map(str::to_string))
        .collect();
    let num_ids: HashSet<String> = numbering_root
        .iter()
        .filter(|n| n.namespace() == Some(WORDPROCESSINGML) && n.local_name() == "num")
        .filter_map(|n| n.attr(&format!("{{{WORDPROCESSINGML}}}numId")).map(str::to_string))
        .collect();

    // abstractNumId links inside numbering.xml: every <w:num>'s abstractNumId must exist.
    ctx.enter_part(numbering_uri.as_str());
    for num_node in numbering_root.iter().filter(|n| n.namespace() == Some(WORDPROCESSINGML) && n.local_name() == "num") {
        let Some(abstract_ref) = num_node.children.iter().find(|c| c.local_name() == "abstractNumId") else { continue };
        let Some(abstract_id) = abstract_ref.attr(&format!("{{{WORDPROCESSINGML}}}val")) else { continue };
        if !abstract_ids.contains(abstract_id) {
            ctx.record(ErrorKind::Semantic, Severity::Error, format!("Numbering abstractNumId '{abstract_id}' does not exist"));
        }
    }

    // numId references from the document body.
    ctx.enter_part(main_uri);
    for node in doc_root.iter() {
        if node.namespace() != Some(WORDPROCESSINGML) || node.local_name() != "numId" {
            continue;
        }
        let Some(num_id) = node.attr(&format!("{{{WORDPROCESSINGML}}}val")) else { continue };
        if num_id != "0" && !num_ids.contains(num_id) {
            ctx.record(ErrorKind::Semantic, Severity::Error, format!("Numbering id '{num_id}' does not exist"));
        }
    }
}

/// Every custom-xml relationship's target part must itself carry a
/// `customXmlProps` relationship.
fn validate_custom_xml_items(ctx: &mut ValidationContext, main_rels: &crate::ooxml::opc::rel::Relationships) {
    for rel in main_rels.iter().filter(|r| r.reltype() == REL_CUSTOM_XML) {
        if rel.is_external() {
            continue;
        }
        let Ok(item_uri) = rel.target_partname() else { continue };
        let Ok(item_part) = ctx.package.get_part(&item_uri) else { continue };
        ctx.enter_part(item_uri.as_str());
        if item_part.rels().iter().find(|r| r.reltype() == REL_CUSTOM_XML_PROPS).is_none() {
            ctx.record(ErrorKind::Semantic, Severity::Error, "Custom XML item has no customXmlProps relationship");
        }
    }
}

/// Settings-referenced footnotes/endnotes must exist in their owning part.
fn validate_footnote_endnote_references(ctx: &mut ValidationContext, main_uri: &str, main_rels: &crate::ooxml::opc::rel::Relationships) {
    let Some(settings_rel) = main_rels.iter().find(|r| r.reltype() == REL_SETTINGS) else { return };
    if settings_rel.is_external() {
        return;
    }
    let Ok(settings_uri) = settings_rel.target_partname() else { return };
    let Ok(settings_part) = ctx.package.get_part(&settings_uri) else { return };
    let Ok(settings_root) = xmltree::parse(settings_part.blob()) else { return };

    validate_note_references(ctx, main_uri, &settings_root, main_rels, "footnote", REL_FOOTNOTES);
    validate_note_references(ctx, main_uri, &settings_root, main_rels, "endnote", REL_ENDNOTES);
}

fn validate_note_references(
    ctx: &mut ValidationContext,
    main_uri: &str,
    settings_root: &XmlNode,
    main_rels: &crate::ooxml::opc::rel::Relationships,
    local_name: &str,
    reltype: &str,
) {
    let referenced: Vec<&str> = settings_root
        .iter()
        .filter(|n| n.namespace() == Some(WORDPROCESSINGML) && n.local_name() == local_name)
        .filter_map(|n| n.attr(&format!("{{{WORDPROCESSINGML}}}id")))
        .collect();
    if referenced.is_empty() {
        return;
    }
    let Some(rel) = main_rels.iter().find(|r| r.reltype() == reltype) else { return };
    if rel.is_external() {
        return;
    }
    let Ok(notes_uri) = rel.target_partname() else { return };
    let Ok(notes_part) = ctx.package.get_part(&notes_uri) else { return };
    let Ok(notes_root) = xmltree::parse(notes_part.blob()) else { return };
    let known: HashSet<&str> = notes_root
        .iter()
        .filter(|n| n.namespace() == Some(WORDPROCESSINGML) && n.local_name() == local_name)
        .filter_map(|n| n.attr(&format!("{{{WORDPROCESSINGML}}}id")))
        .collect();

    ctx.enter_part(main_uri);
    for id in referenced {
        if id != "-1" && id != "0" && !known.contains(id) {
            ctx.record(ErrorKind::Semantic, Severity::Error, format!("Referenced {local_name} '{id}' does not exist"));
        }
    }
}

/// Spreadsheet: every shared-string index referenced by a worksheet cell
/// must be non-negative and less than the shared-string table's count.
fn validate_spreadsheet_shared_strings(ctx: &mut ValidationContext) {
    let Ok(main) = ctx.package.main_document_part() else { return };

    let Some(shared_strings_rel) = main.rels().iter().find(|r| r.reltype() == REL_SHARED_STRINGS) else { return };
    let Ok(shared_strings_uri) = shared_strings_rel.target_partname() else { return };
    let Ok(shared_strings_part) = ctx.package.get_part(&shared_strings_uri) else { return };
    let Ok(shared_strings_root) = xmltree::parse(shared_strings_part.blob()) else { return };
    let count = shared_strings_root.children.iter().filter(|n| n.local_name() == "si").count();

    for rel in main.rels().iter().filter(|r| r.reltype() == REL_WORKSHEET) {
        if rel.is_external() {
            continue;
        }
        let Ok(sheet_uri) = rel.target_partname() else { continue };
        let Ok(sheet_part) = ctx.package.get_part(&sheet_uri) else { continue };
        let Ok(sheet_root) = xmltree::parse(sheet_part.blob()) else { continue };

        ctx.enter_part(sheet_uri.as_str());
        for cell in sheet_root.iter().filter(|n| n.namespace() == Some(SPREADSHEETML) && n.local_name() == "c") {
            if cell.attr_local("t") != Some("s") {
                continue;
            }
            let Some(value_node) = cell.children.iter().find(|c| c.local_name() == "v") else { continue };
            let Ok(index) = value_node.text.trim().parse::<i64>() else { continue };
            if index < 0 || index as usize >= count {
                ctx.record(ErrorKind::Semantic, Severity::Error, format!("Shared string index {index} out of range (count {count})"));
            }
        }
    }
}
