//! The instrument and tuning XML schemas.
//!
//! Only the root element carries the schema namespace; every child element
//! is unqualified. Numbers are written with the shortest representation that
//! parses back to the same `f64`.

use std::fmt::Display;

use roxmltree::{Document, Node};

use crate::{
    BorePoint, DesignerError, Fingering, Hole, Instrument, LengthType, Mouthpiece,
    MouthpieceKind, Note, ReedType, Result, Termination, Tuning,
};

pub const INSTRUMENT_NAMESPACE: &str = "http://www.wwidesigner.com/Instrument";
pub const TUNING_NAMESPACE: &str = "http://www.wwidesigner.com/Tuning";

fn root<'a, 'input>(
    document: &'a Document<'input>,
    namespace: &str,
    name: &str,
) -> Result<Node<'a, 'input>> {
    let root = document.root_element();
    let tag = root.tag_name();
    if tag.name() != name {
        return Err(DesignerError::document(format!(
            "expected <{name}> root element, found <{}>",
            tag.name()
        )));
    }
    match tag.namespace() {
        Some(found) if found != namespace => Err(DesignerError::document(format!(
            "<{name}> is in namespace {found}, expected {namespace}"
        ))),
        _ => Ok(root),
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

fn text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name).map(|element| element.text().unwrap_or_default().to_string())
}

fn required_text(node: Node<'_, '_>, name: &str) -> Result<String> {
    text(node, name).ok_or_else(|| missing(node, name))
}

fn missing(node: Node<'_, '_>, name: &str) -> DesignerError {
    DesignerError::document(format!(
        "<{}> is missing <{name}>",
        node.tag_name().name()
    ))
}

fn parse_value<T: std::str::FromStr>(node: Node<'_, '_>, name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        DesignerError::document(format!(
            "<{name}> in <{}> is not a valid value: `{}`",
            node.tag_name().name(),
            raw.trim()
        ))
    })
}

fn value<T: std::str::FromStr>(node: Node<'_, '_>, name: &str) -> Result<Option<T>> {
    text(node, name)
        .map(|raw| parse_value(node, name, &raw))
        .transpose()
}

fn required_value<T: std::str::FromStr>(node: Node<'_, '_>, name: &str) -> Result<T> {
    value(node, name)?.ok_or_else(|| missing(node, name))
}

pub fn parse_instrument(source: &str) -> Result<Instrument> {
    let document = Document::parse(source)?;
    let root = root(&document, INSTRUMENT_NAMESPACE, "instrument")?;

    let length_type = match text(root, "lengthType") {
        Some(raw) => LengthType::parse(&raw)
            .ok_or_else(|| DesignerError::document(format!("unknown length type `{raw}`")))?,
        None => LengthType::default(),
    };

    let mouthpiece_node = child(root, "mouthpiece").ok_or_else(|| missing(root, "mouthpiece"))?;
    let mouthpiece = Mouthpiece {
        position: required_value(mouthpiece_node, "position")?,
        kind: parse_mouthpiece_kind(mouthpiece_node)?,
    };

    let bore_points = children(root, "borePoint")
        .map(|point| -> Result<BorePoint> {
            Ok(BorePoint::new(
                required_value(point, "borePosition")?,
                required_value(point, "boreDiameter")?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let holes = children(root, "hole")
        .map(|hole| -> Result<Hole> {
            Ok(Hole {
                name: text(hole, "name"),
                position: required_value(hole, "borePosition")?,
                diameter: required_value(hole, "diameter")?,
                height: required_value(hole, "height")?,
                inner_curvature_radius: value(hole, "innerCurvatureRadius")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let termination = match child(root, "termination") {
        Some(node) => Termination {
            flange_diameter: value(node, "flangeDiameter")?.unwrap_or(0.0),
        },
        None => Termination::default(),
    };

    Ok(Instrument {
        name: required_text(root, "name")?,
        description: text(root, "description"),
        length_type,
        mouthpiece,
        bore_points,
        holes,
        termination,
    })
}

fn parse_mouthpiece_kind(node: Node<'_, '_>) -> Result<MouthpieceKind> {
    if let Some(fipple) = child(node, "fipple") {
        return Ok(MouthpieceKind::Fipple {
            window_length: required_value(fipple, "windowLength")?,
            window_width: required_value(fipple, "windowWidth")?,
            window_height: value(fipple, "windowHeight")?,
            windway_height: value(fipple, "windwayHeight")?,
            fipple_factor: value(fipple, "fippleFactor")?,
        });
    }
    if let Some(hole) = child(node, "embouchureHole") {
        return Ok(MouthpieceKind::EmbouchureHole {
            length: required_value(hole, "length")?,
            width: required_value(hole, "width")?,
            height: required_value(hole, "height")?,
            airstream_length: required_value(hole, "airstreamLength")?,
            airstream_height: required_value(hole, "airstreamHeight")?,
        });
    }
    for (tag, reed) in [
        ("singleReed", ReedType::Single),
        ("doubleReed", ReedType::Double),
        ("lipReed", ReedType::Lip),
    ] {
        if child(node, tag).is_some() {
            return Ok(MouthpieceKind::Reed(reed));
        }
    }
    Err(DesignerError::document(
        "<mouthpiece> needs one of <fipple>, <embouchureHole>, <singleReed>, <doubleReed>, <lipReed>",
    ))
}

pub fn parse_tuning(source: &str) -> Result<Tuning> {
    let document = Document::parse(source)?;
    let root = root(&document, TUNING_NAMESPACE, "tuning")?;

    let fingerings = children(root, "fingering")
        .map(parse_fingering)
        .collect::<Result<Vec<_>>>()?;

    Ok(Tuning {
        name: required_text(root, "name")?,
        comment: text(root, "comment"),
        number_of_holes: required_value(root, "numberOfHoles")?,
        fingerings,
    })
}

fn parse_fingering(node: Node<'_, '_>) -> Result<Fingering> {
    let note = child(node, "note")
        .map(|note| -> Result<Note> {
            Ok(Note {
                name: text(note, "name"),
                frequency: value(note, "frequency")?,
                frequency_min: value(note, "frequencyMin")?,
                frequency_max: value(note, "frequencyMax")?,
            })
        })
        .transpose()?;

    let open_holes = children(node, "openHole")
        .map(|hole| parse_value(node, "openHole", hole.text().unwrap_or_default()))
        .collect::<Result<Vec<bool>>>()?;

    Ok(Fingering {
        note,
        open_holes,
        open_end: value(node, "openEnd")?,
        optimization_weight: value(node, "optimizationWeight")?,
    })
}

/// Indenting element writer.
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            out: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"),
            depth: 0,
        }
    }

    /// Appends one indented line.
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn root(&mut self, name: &str, namespace: &str) {
        self.line(&format!("<wwi:{name} xmlns:wwi=\"{namespace}\">"));
        self.depth += 1;
    }

    fn end_root(&mut self, name: &str) {
        self.depth -= 1;
        self.line(&format!("</wwi:{name}>"));
    }

    fn open(&mut self, name: &str) {
        self.line(&format!("<{name}>"));
        self.depth += 1;
    }

    fn close(&mut self, name: &str) {
        self.depth -= 1;
        self.line(&format!("</{name}>"));
    }

    fn empty(&mut self, name: &str) {
        self.line(&format!("<{name}/>"));
    }

    fn leaf(&mut self, name: &str, value: impl Display) {
        self.line(&format!("<{name}>{}</{name}>", escape(&value.to_string())));
    }

    fn optional(&mut self, name: &str, value: Option<impl Display>) {
        if let Some(value) = value {
            self.leaf(name, value);
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn write_instrument(instrument: &Instrument) -> String {
    let mut w = XmlWriter::new();
    w.root("instrument", INSTRUMENT_NAMESPACE);
    w.leaf("name", &instrument.name);
    w.optional("description", instrument.description.as_ref());
    w.leaf("lengthType", instrument.length_type);

    w.open("mouthpiece");
    w.leaf("position", instrument.mouthpiece.position);
    match &instrument.mouthpiece.kind {
        MouthpieceKind::Fipple {
            window_length,
            window_width,
            window_height,
            windway_height,
            fipple_factor,
        } => {
            w.open("fipple");
            w.leaf("windowLength", window_length);
            w.leaf("windowWidth", window_width);
            w.optional("windowHeight", window_height.as_ref());
            w.optional("windwayHeight", windway_height.as_ref());
            w.optional("fippleFactor", fipple_factor.as_ref());
            w.close("fipple");
        }
        MouthpieceKind::EmbouchureHole {
            length,
            width,
            height,
            airstream_length,
            airstream_height,
        } => {
            w.open("embouchureHole");
            w.leaf("length", length);
            w.leaf("width", width);
            w.leaf("height", height);
            w.leaf("airstreamLength", airstream_length);
            w.leaf("airstreamHeight", airstream_height);
            w.close("embouchureHole");
        }
        MouthpieceKind::Reed(ReedType::Single) => w.empty("singleReed"),
        MouthpieceKind::Reed(ReedType::Double) => w.empty("doubleReed"),
        MouthpieceKind::Reed(ReedType::Lip) => w.empty("lipReed"),
    }
    w.close("mouthpiece");

    for point in &instrument.bore_points {
        w.open("borePoint");
        w.leaf("borePosition", point.position);
        w.leaf("boreDiameter", point.diameter);
        w.close("borePoint");
    }

    for hole in &instrument.holes {
        w.open("hole");
        w.optional("name", hole.name.as_ref());
        w.leaf("borePosition", hole.position);
        w.leaf("diameter", hole.diameter);
        w.leaf("height", hole.height);
        w.optional("innerCurvatureRadius", hole.inner_curvature_radius);
        w.close("hole");
    }

    w.open("termination");
    w.leaf("flangeDiameter", instrument.termination.flange_diameter);
    w.close("termination");

    w.end_root("instrument");
    w.finish()
}

pub fn write_tuning(tuning: &Tuning) -> String {
    let mut w = XmlWriter::new();
    w.root("tuning", TUNING_NAMESPACE);
    w.leaf("name", &tuning.name);
    w.optional("comment", tuning.comment.as_ref());
    w.leaf("numberOfHoles", tuning.number_of_holes);

    for fingering in &tuning.fingerings {
        w.open("fingering");
        if let Some(note) = &fingering.note {
            w.open("note");
            w.optional("name", note.name.as_ref());
            w.optional("frequency", note.frequency);
            w.optional("frequencyMin", note.frequency_min);
            w.optional("frequencyMax", note.frequency_max);
            w.close("note");
        }
        for open in &fingering.open_holes {
            w.leaf("openHole", open);
        }
        w.optional("openEnd", fingering.open_end);
        w.optional("optimizationWeight", fingering.optimization_weight);
        w.close("fingering");
    }

    w.end_root("tuning");
    w.finish()
}
