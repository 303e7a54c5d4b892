//! PresentationML part bodies.
//!
//! Only what a title-plus-pictures deck needs: one master, a title layout, a
//! blank layout and a plain theme. Slide XML is generated per slide.

use std::fmt::Write as _;

use crate::error::DeckError;

pub(crate) const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CT: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub(crate) mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const PRES_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
}

pub(crate) mod content_type {
    pub const RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const PRES_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
}

/// Escape XML special characters.
#[inline]
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn xml_err(e: std::fmt::Error) -> DeckError {
    DeckError::Xml(e.to_string())
}

/// One `<Relationship>` entry.
pub(crate) struct Rel<'a> {
    pub id: String,
    pub rel_type: &'a str,
    pub target: String,
}

pub(crate) fn relationships(rels: &[Rel<'_>]) -> Result<String, DeckError> {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    write!(xml, r#"<Relationships xmlns="{NS_PKG_RELS}">"#).map_err(xml_err)?;
    for rel in rels {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            rel.id,
            rel.rel_type,
            escape_xml(&rel.target)
        )
        .map_err(xml_err)?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

/// `[Content_Types].xml`: extension defaults plus per-part overrides.
pub(crate) fn content_types(
    defaults: &[(&str, &str)],
    overrides: &[(String, &str)],
) -> Result<String, DeckError> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(xml, r#"<Types xmlns="{NS_CT}">"#).map_err(xml_err)?;
    for (ext, ct) in defaults {
        write!(xml, r#"<Default Extension="{ext}" ContentType="{ct}"/>"#).map_err(xml_err)?;
    }
    for (part, ct) in overrides {
        write!(
            xml,
            r#"<Override PartName="{}" ContentType="{ct}"/>"#,
            escape_xml(part)
        )
        .map_err(xml_err)?;
    }
    xml.push_str("</Types>");
    Ok(xml)
}

/// `ppt/presentation.xml`. Slides are related as `rId3`, `rId4`, ...
pub(crate) fn presentation(
    slide_count: usize,
    slide_cx: i64,
    slide_cy: i64,
) -> Result<String, DeckError> {
    let mut xml = String::with_capacity(1024 + slide_count * 48);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1">"#
    )
    .map_err(xml_err)?;

    xml.push_str("<p:sldMasterIdLst>");
    xml.push_str(r#"<p:sldMasterId id="2147483648" r:id="rId1"/>"#);
    xml.push_str("</p:sldMasterIdLst>");

    if slide_count > 0 {
        xml.push_str("<p:sldIdLst>");
        for i in 0..slide_count {
            write!(xml, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, 3 + i).map_err(xml_err)?;
        }
        xml.push_str("</p:sldIdLst>");
    }

    write!(xml, r#"<p:sldSz cx="{slide_cx}" cy="{slide_cy}"/>"#).map_err(xml_err)?;
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    Ok(xml)
}

pub(crate) fn pres_props() -> String {
    format!(r#"{XML_DECL}<p:presentationPr xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#)
}

fn open_slide_like(xml: &mut String, root: &str, extra_attrs: &str) -> Result<(), DeckError> {
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:{root} xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"{extra_attrs}>"#
    )
    .map_err(xml_err)
}

fn group_shape_props(xml: &mut String) {
    xml.push_str("<p:nvGrpSpPr>");
    xml.push_str(r#"<p:cNvPr id="1" name=""/>"#);
    xml.push_str("<p:cNvGrpSpPr/>");
    xml.push_str("<p:nvPr/>");
    xml.push_str("</p:nvGrpSpPr>");
    xml.push_str("<p:grpSpPr>");
    xml.push_str("<a:xfrm>");
    xml.push_str(r#"<a:off x="0" y="0"/>"#);
    xml.push_str(r#"<a:ext cx="0" cy="0"/>"#);
    xml.push_str(r#"<a:chOff x="0" y="0"/>"#);
    xml.push_str(r#"<a:chExt cx="0" cy="0"/>"#);
    xml.push_str("</a:xfrm>");
    xml.push_str("</p:grpSpPr>");
}

/// `ppt/slideMasters/slideMaster1.xml` with its two layouts listed.
pub(crate) fn slide_master() -> Result<String, DeckError> {
    let mut xml = String::with_capacity(2048);
    open_slide_like(&mut xml, "sldMaster", "")?;
    xml.push_str("<p:cSld>");
    xml.push_str(r#"<p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#);
    xml.push_str("<p:spTree>");
    group_shape_props(&mut xml);
    xml.push_str("</p:spTree>");
    xml.push_str("</p:cSld>");
    xml.push_str(
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
    );
    xml.push_str("<p:sldLayoutIdLst>");
    xml.push_str(r#"<p:sldLayoutId id="2147483649" r:id="rId1"/>"#);
    xml.push_str(r#"<p:sldLayoutId id="2147483650" r:id="rId2"/>"#);
    xml.push_str("</p:sldLayoutIdLst>");
    xml.push_str("<p:txStyles>");
    for style in ["titleStyle", "bodyStyle", "otherStyle"] {
        write!(
            xml,
            r#"<p:{style}><a:lvl1pPr><a:defRPr><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:{style}>"#
        )
        .map_err(xml_err)?;
    }
    xml.push_str("</p:txStyles>");
    xml.push_str("</p:sldMaster>");
    Ok(xml)
}

/// A slide layout: `"title"` for the opening slide, `"blank"` for pictures.
pub(crate) fn slide_layout(kind: &str, name: &str) -> Result<String, DeckError> {
    let mut xml = String::with_capacity(1024);
    open_slide_like(
        &mut xml,
        "sldLayout",
        &format!(r#" type="{kind}" preserve="1""#),
    )?;
    write!(xml, r#"<p:cSld name="{}">"#, escape_xml(name)).map_err(xml_err)?;
    xml.push_str("<p:spTree>");
    group_shape_props(&mut xml);
    xml.push_str("</p:spTree>");
    xml.push_str("</p:cSld>");
    xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
    xml.push_str("</p:sldLayout>");
    Ok(xml)
}

/// Title slide with the category name centered across the slide.
pub(crate) fn title_slide(
    title: &str,
    slide_cx: i64,
    slide_cy: i64,
) -> Result<String, DeckError> {
    let mut xml = String::with_capacity(2048);
    open_slide_like(&mut xml, "sld", "")?;
    xml.push_str("<p:cSld>");
    xml.push_str("<p:spTree>");
    group_shape_props(&mut xml);

    let x = slide_cx / 10;
    let cx = slide_cx - 2 * x;
    let cy = slide_cy / 5;
    let y = (slide_cy - cy) / 2;

    xml.push_str("<p:sp>");
    xml.push_str("<p:nvSpPr>");
    xml.push_str(r#"<p:cNvPr id="2" name="Title 1"/>"#);
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
    xml.push_str(r#"<p:nvPr><p:ph type="ctrTitle"/></p:nvPr>"#);
    xml.push_str("</p:nvSpPr>");
    xml.push_str("<p:spPr>");
    write!(
        xml,
        r#"<a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#
    )
    .map_err(xml_err)?;
    xml.push_str("</p:spPr>");
    xml.push_str("<p:txBody>");
    xml.push_str(r#"<a:bodyPr anchor="ctr"/>"#);
    xml.push_str("<a:lstStyle/>");
    xml.push_str(r#"<a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="4400" dirty="0"/>"#);
    write!(xml, "<a:t>{}</a:t>", escape_xml(title)).map_err(xml_err)?;
    xml.push_str("</a:r></a:p>");
    xml.push_str("</p:txBody>");
    xml.push_str("</p:sp>");

    xml.push_str("</p:spTree>");
    xml.push_str("</p:cSld>");
    xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
    xml.push_str("</p:sld>");
    Ok(xml)
}

/// Slide with one picture, related to its media part as `rId2`.
pub(crate) fn picture_slide(
    description: &str,
    (x, y, cx, cy): (i64, i64, i64, i64),
) -> Result<String, DeckError> {
    let mut xml = String::with_capacity(2048);
    open_slide_like(&mut xml, "sld", "")?;
    xml.push_str("<p:cSld>");
    xml.push_str("<p:spTree>");
    group_shape_props(&mut xml);

    xml.push_str("<p:pic>");
    xml.push_str("<p:nvPicPr>");
    write!(
        xml,
        r#"<p:cNvPr id="2" name="Picture 1" descr="{}"/>"#,
        escape_xml(description)
    )
    .map_err(xml_err)?;
    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>"#);
    xml.push_str("<p:nvPr/>");
    xml.push_str("</p:nvPicPr>");

    xml.push_str("<p:blipFill>");
    xml.push_str(r#"<a:blip r:embed="rId2"/>"#);
    xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
    xml.push_str("</p:blipFill>");

    xml.push_str("<p:spPr>");
    xml.push_str("<a:xfrm>");
    write!(xml, r#"<a:off x="{x}" y="{y}"/>"#).map_err(xml_err)?;
    write!(xml, r#"<a:ext cx="{cx}" cy="{cy}"/>"#).map_err(xml_err)?;
    xml.push_str("</a:xfrm>");
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("</p:spPr>");
    xml.push_str("</p:pic>");

    xml.push_str("</p:spTree>");
    xml.push_str("</p:cSld>");
    xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
    xml.push_str("</p:sld>");
    Ok(xml)
}

/// A plain Office-style theme.
pub(crate) fn theme() -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(r#"<a:theme xmlns:a="{NS_A}" name="Office Theme">"#));
    xml.push_str("<a:themeElements>");

    xml.push_str(r#"<a:clrScheme name="Office">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    for (slot, rgb) in [
        ("dk2", "44546A"),
        ("lt2", "E7E6E6"),
        ("accent1", "4472C4"),
        ("accent2", "ED7D31"),
        ("accent3", "A5A5A5"),
        ("accent4", "FFC000"),
        ("accent5", "5B9BD5"),
        ("accent6", "70AD47"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ] {
        xml.push_str(&format!(r#"<a:{slot}><a:srgbClr val="{rgb}"/></a:{slot}>"#));
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(r#"<a:fontScheme name="Office">"#);
    for slot in ["majorFont", "minorFont"] {
        xml.push_str(&format!(
            r#"<a:{slot}><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:{slot}>"#
        ));
    }
    xml.push_str("</a:fontScheme>");

    xml.push_str(r#"<a:fmtScheme name="Office">"#);
    xml.push_str("<a:fillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:fillStyleLst>");
    xml.push_str("<a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        xml.push_str(&format!(
            r#"<a:ln w="{width}"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#
        ));
    }
    xml.push_str("</a:lnStyleLst>");
    xml.push_str("<a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst>");
    xml.push_str("<a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:bgFillStyleLst>");
    xml.push_str("</a:fmtScheme>");

    xml.push_str("</a:themeElements>");
    xml.push_str("</a:theme>");
    xml
}
