//! Minimal `.pptx` package writer.
//!
//! A deck is a title slide followed by one picture slide per image. Parts are
//! generated in memory and streamed into a zip container on save.

use std::io::{Seek, Write};
use std::path::Path;

use zip::write::{SimpleFileOptions, ZipWriter};

use crate::error::DeckError;
use crate::layout::{inches_to_emu, Placement, SlideSize};

use super::xml::{self, content_type, rel_type, Rel};

/// Picture encodings a deck can embed as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Png,
    Jpeg,
}

impl MediaFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            MediaFormat::Png => "png",
            MediaFormat::Jpeg => "jpeg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MediaFormat::Png => "image/png",
            MediaFormat::Jpeg => "image/jpeg",
        }
    }
}

struct PictureSlide {
    bytes: Vec<u8>,
    format: MediaFormat,
    description: String,
    emu: (i64, i64, i64, i64),
}

/// In-memory deck, written out with [`PptxWriter::save`].
pub struct PptxWriter {
    title: String,
    slide_cx: i64,
    slide_cy: i64,
    pictures: Vec<PictureSlide>,
}

impl PptxWriter {
    pub fn new(title: impl Into<String>, slide: SlideSize) -> Self {
        Self {
            title: title.into(),
            slide_cx: inches_to_emu(slide.width),
            slide_cy: inches_to_emu(slide.height),
            pictures: Vec::new(),
        }
    }

    /// Append a slide showing one picture at `placement`.
    pub fn add_picture(
        &mut self,
        bytes: Vec<u8>,
        format: MediaFormat,
        description: impl Into<String>,
        placement: &Placement,
    ) {
        self.pictures.push(PictureSlide {
            bytes,
            format,
            description: description.into(),
            emu: placement.to_emu(),
        });
    }

    /// Number of picture slides (title slide excluded).
    pub fn picture_count(&self) -> usize {
        self.pictures.len()
    }

    /// Total slides including the title slide.
    pub fn slide_count(&self) -> usize {
        1 + self.pictures.len()
    }

    /// Write the package to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), DeckError> {
        let file = std::fs::File::create(path).map_err(|source| DeckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = self.write_to(std::io::BufWriter::new(file))?;
        writer.flush().map_err(|source| DeckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Write the package into any seekable sink and hand the sink back.
    pub fn write_to<W: Write + Seek>(&self, sink: W) -> Result<W, DeckError> {
        let mut zip = ZipWriter::new(sink);
        put_part(&mut zip, "[Content_Types].xml", self.content_types()?.as_bytes(), deflated())?;
        put_part(
            &mut zip,
            "_rels/.rels",
            xml::relationships(&[Rel {
                id: "rId1".into(),
                rel_type: rel_type::OFFICE_DOCUMENT,
                target: "ppt/presentation.xml".into(),
            }])?
            .as_bytes(),
            deflated(),
        )?;

        let slide_count = self.slide_count();
        put_part(
            &mut zip,
            "ppt/presentation.xml",
            xml::presentation(slide_count, self.slide_cx, self.slide_cy)?.as_bytes(),
            deflated(),
        )?;
        put_part(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            self.presentation_rels()?.as_bytes(),
            deflated(),
        )?;
        put_part(&mut zip, "ppt/presProps.xml", xml::pres_props().as_bytes(), deflated())?;

        put_part(
            &mut zip,
            "ppt/slideMasters/slideMaster1.xml",
            xml::slide_master()?.as_bytes(),
            deflated(),
        )?;
        put_part(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            xml::relationships(&[
                rel("rId1", rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                rel("rId2", rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout2.xml"),
                rel("rId3", rel_type::THEME, "../theme/theme1.xml"),
            ])?
            .as_bytes(),
            deflated(),
        )?;

        for (index, (kind, name)) in [("title", "Title Slide"), ("blank", "Blank")]
            .into_iter()
            .enumerate()
        {
            let n = index + 1;
            put_part(
                &mut zip,
                &format!("ppt/slideLayouts/slideLayout{n}.xml"),
                xml::slide_layout(kind, name)?.as_bytes(),
                deflated(),
            )?;
            put_part(
                &mut zip,
                &format!("ppt/slideLayouts/_rels/slideLayout{n}.xml.rels"),
                xml::relationships(&[rel(
                    "rId1",
                    rel_type::SLIDE_MASTER,
                    "../slideMasters/slideMaster1.xml",
                )])?
                .as_bytes(),
                deflated(),
            )?;
        }

        put_part(&mut zip, "ppt/theme/theme1.xml", xml::theme().as_bytes(), deflated())?;

        put_part(
            &mut zip,
            "ppt/slides/slide1.xml",
            xml::title_slide(&self.title, self.slide_cx, self.slide_cy)?.as_bytes(),
            deflated(),
        )?;
        put_part(
            &mut zip,
            "ppt/slides/_rels/slide1.xml.rels",
            xml::relationships(&[rel(
                "rId1",
                rel_type::SLIDE_LAYOUT,
                "../slideLayouts/slideLayout1.xml",
            )])?
            .as_bytes(),
            deflated(),
        )?;

        for (index, picture) in self.pictures.iter().enumerate() {
            let slide_n = index + 2;
            let media_name = format!("image{}.{}", index + 1, picture.format.extension());

            put_part(
                &mut zip,
                &format!("ppt/slides/slide{slide_n}.xml"),
                xml::picture_slide(&picture.description, picture.emu)?.as_bytes(),
                deflated(),
            )?;
            put_part(
                &mut zip,
                &format!("ppt/slides/_rels/slide{slide_n}.xml.rels"),
                xml::relationships(&[
                    rel(
                        "rId1",
                        rel_type::SLIDE_LAYOUT,
                        "../slideLayouts/slideLayout2.xml",
                    ),
                    Rel {
                        id: "rId2".into(),
                        rel_type: rel_type::IMAGE,
                        target: format!("../media/{media_name}"),
                    },
                ])?
                .as_bytes(),
                deflated(),
            )?;
            put_part(
                &mut zip,
                &format!("ppt/media/{media_name}"),
                &picture.bytes,
                stored(),
            )?;
        }

        Ok(zip.finish()?)
    }

    fn content_types(&self) -> Result<String, DeckError> {
        let mut overrides: Vec<(String, &str)> = vec![
            ("/ppt/presentation.xml".into(), content_type::PRESENTATION),
            ("/ppt/presProps.xml".into(), content_type::PRES_PROPS),
            (
                "/ppt/slideMasters/slideMaster1.xml".into(),
                content_type::SLIDE_MASTER,
            ),
            (
                "/ppt/slideLayouts/slideLayout1.xml".into(),
                content_type::SLIDE_LAYOUT,
            ),
            (
                "/ppt/slideLayouts/slideLayout2.xml".into(),
                content_type::SLIDE_LAYOUT,
            ),
            ("/ppt/theme/theme1.xml".into(), content_type::THEME),
        ];
        for n in 1..=self.slide_count() {
            overrides.push((format!("/ppt/slides/slide{n}.xml"), content_type::SLIDE));
        }

        xml::content_types(
            &[
                ("rels", content_type::RELS),
                ("xml", content_type::XML),
                (MediaFormat::Png.extension(), MediaFormat::Png.content_type()),
                (MediaFormat::Jpeg.extension(), MediaFormat::Jpeg.content_type()),
            ],
            &overrides,
        )
    }

    fn presentation_rels(&self) -> Result<String, DeckError> {
        let mut rels = vec![
            rel("rId1", rel_type::SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
            rel("rId2", rel_type::THEME, "theme/theme1.xml"),
        ];
        let slide_count = self.slide_count();
        for n in 1..=slide_count {
            rels.push(Rel {
                id: format!("rId{}", n + 2),
                rel_type: rel_type::SLIDE,
                target: format!("slides/slide{n}.xml"),
            });
        }
        rels.push(Rel {
            id: format!("rId{}", slide_count + 3),
            rel_type: rel_type::PRES_PROPS,
            target: "presProps.xml".into(),
        });
        xml::relationships(&rels)
    }
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated)
}

// Media is already compressed.
fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored)
}

fn put_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    body: &[u8],
    options: SimpleFileOptions,
) -> Result<(), DeckError> {
    zip.start_file(name, options)?;
    zip.write_all(body).map_err(|source| DeckError::Io {
        path: name.into(),
        source,
    })
}

fn rel<'a>(id: &str, rel_type: &'a str, target: &str) -> Rel<'a> {
    Rel {
        id: id.to_string(),
        rel_type,
        target: target.to_string(),
    }
}
