//! XML form of an option tree.
//!
//! Every node is one element named after the node, with the node's
//! attributes as XML attributes. A value is stored in a dedicated child
//! element whose name carries the type:
//!
//! ```xml
//! <options>
//!   <simulation name="lock_exchange">
//!     <timestep>
//!       <real_value rank="0">0.01</real_value>
//!     </timestep>
//!     <dimensions>
//!       <integer_value rank="1" shape="3">40 1 20</integer_value>
//!     </dimensions>
//!     <fields>
//!       <string_value rank="1" shape="2">
//!         <item>Temperature</item>
//!         <item>Velocity</item>
//!       </string_value>
//!     </fields>
//!   </simulation>
//! </options>
//! ```
//!
//! Numbers are whitespace separated in row-major order. `shape` is the
//! vector length for rank 1 and `rows cols` for rank 2. A rank-0 string is
//! the element text verbatim; higher-rank strings use one `item` element
//! per entry.

use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use super::{PersistenceError, validate_tree};
use crate::store::{Node, OptionStore, OptionType, Rank, Shape, Shaped, Value};

const INTEGER_ELEMENT: &str = "integer_value";
const REAL_ELEMENT: &str = "real_value";
const STRING_ELEMENT: &str = "string_value";
const ITEM_ELEMENT: &str = "item";

fn xml_error(err: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Xml {
        reason: err.to_string(),
    }
}

fn invalid(reason: impl Into<String>) -> PersistenceError {
    PersistenceError::InvalidDocument {
        reason: reason.into(),
    }
}

/// Returns true if `name` can be written as an XML element or attribute name.
pub fn is_valid_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Returns true if every character of `text` may appear in an XML 1.0
/// document. Control characters other than tab, newline and carriage
/// return are excluded, as are U+FFFE and U+FFFF.
pub fn is_xml_text(text: &str) -> bool {
    text.chars().all(|c| {
        matches!(
            c,
            '\t' | '\n'
                | '\r'
                | '\u{20}'..='\u{D7FF}'
                | '\u{E000}'..='\u{FFFD}'
                | '\u{10000}'..='\u{10FFFF}'
        )
    })
}

fn value_element(option_type: OptionType) -> &'static str {
    match option_type {
        OptionType::Integer => INTEGER_ELEMENT,
        OptionType::Double => REAL_ELEMENT,
        OptionType::String => STRING_ELEMENT,
    }
}

fn value_kind(element: &str) -> Option<OptionType> {
    match element {
        INTEGER_ELEMENT => Some(OptionType::Integer),
        REAL_ELEMENT => Some(OptionType::Double),
        STRING_ELEMENT => Some(OptionType::String),
        _ => None,
    }
}

// ---- writing ----

type XmlWriter = Writer<Vec<u8>>;

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), PersistenceError> {
    writer.write_event(event).map_err(xml_error)
}

fn check_names(node: &Node) -> Result<(), PersistenceError> {
    let unrepresentable = |reason: String| PersistenceError::Unrepresentable {
        name: node.name().to_string(),
        reason,
    };

    if !is_valid_xml_name(node.name()) {
        return Err(unrepresentable("not a valid XML element name".to_string()));
    }
    if value_kind(node.name()).is_some() {
        return Err(unrepresentable(
            "element name is reserved for values".to_string(),
        ));
    }
    if let Some(key) = node.attributes().keys().find(|key| !is_valid_xml_name(key)) {
        return Err(unrepresentable(format!(
            "attribute '{key}' is not a valid XML attribute name"
        )));
    }
    if let Some((key, _)) = node
        .attributes()
        .iter()
        .find(|(_, value)| !is_xml_text(value))
    {
        return Err(unrepresentable(format!(
            "attribute '{key}' holds characters XML cannot carry"
        )));
    }
    if let Some(Value::String(shaped)) = node.value() {
        if !shaped.elements().iter().all(|text| is_xml_text(text)) {
            return Err(unrepresentable(
                "string value holds characters XML cannot carry".to_string(),
            ));
        }
    }
    Ok(())
}

/// Writes `start`, its text content and the closing tag. Empty text is
/// written as a self-closing element.
fn emit_text_element(
    writer: &mut XmlWriter,
    start: BytesStart<'_>,
    text: &str,
) -> Result<(), PersistenceError> {
    if text.is_empty() {
        return emit(writer, Event::Empty(start));
    }
    let end = start.to_end().into_owned();
    emit(writer, Event::Start(start))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(end))
}

fn join_numbers<T: ToString>(elements: &[T]) -> String {
    elements
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_value(writer: &mut XmlWriter, value: &Value) -> Result<(), PersistenceError> {
    let element = value_element(value.option_type());
    let rank = value.rank();
    let shape = value.shape();

    let rank_text = rank.code().to_string();
    let shape_text = match rank {
        Rank::Scalar => None,
        Rank::Vector => Some(shape.rows.to_string()),
        Rank::Matrix => Some(format!("{} {}", shape.rows, shape.cols)),
    };

    let mut start = BytesStart::new(element);
    start.push_attribute(("rank", rank_text.as_str()));
    if let Some(shape_text) = &shape_text {
        start.push_attribute(("shape", shape_text.as_str()));
    }

    match value {
        Value::Integer(shaped) => emit_text_element(writer, start, &join_numbers(shaped.elements())),
        Value::Double(shaped) => emit_text_element(writer, start, &join_numbers(shaped.elements())),
        Value::String(Shaped::Scalar(text)) => emit_text_element(writer, start, text),
        Value::String(shaped) => {
            if shaped.elements().is_empty() {
                return emit(writer, Event::Empty(start));
            }
            emit(writer, Event::Start(start))?;
            for item in shaped.elements() {
                emit_text_element(writer, BytesStart::new(ITEM_ELEMENT), item)?;
            }
            emit(writer, Event::End(BytesEnd::new(element)))
        }
    }
}

fn write_node(writer: &mut XmlWriter, node: &Node) -> Result<(), PersistenceError> {
    check_names(node)?;

    let mut start = BytesStart::new(node.name());
    for (key, value) in node.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.value().is_none() && node.children().is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if let Some(value) = node.value() {
        write_value(writer, value)?;
    }
    for child in node.children() {
        write_node(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(node.name())))
}

/// Renders the tree as an indented XML document.
pub fn to_string(store: &OptionStore) -> Result<String, PersistenceError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;
    write_node(&mut writer, store.root())?;

    let mut text = String::from_utf8(writer.into_inner()).map_err(xml_error)?;
    text.push('\n');
    Ok(text)
}

// ---- reading ----

type XmlReader<'i> = Reader<&'i [u8]>;

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn element_name(start: &BytesStart<'_>) -> Result<String, PersistenceError> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_owned)
        .map_err(xml_error)
}

fn attribute_value(start: &BytesStart<'_>, key: &str) -> Result<Option<String>, PersistenceError> {
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned()));
        }
    }
    Ok(None)
}

fn node_from_start(start: &BytesStart<'_>) -> Result<Node, PersistenceError> {
    let mut node = Node::new(element_name(start)?);
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(xml_error)?;
        let value = attr.unescape_value().map_err(xml_error)?;
        node.set_attribute(key, value.into_owned());
    }
    Ok(node)
}

fn attach_value(node: &mut Node, value: Value) -> Result<(), PersistenceError> {
    if node.value().is_some() {
        return Err(invalid(format!(
            "element '{}' holds more than one value",
            node.name()
        )));
    }
    node.set_value(value);
    Ok(())
}

fn read_node(reader: &mut XmlReader<'_>, start: &BytesStart<'_>) -> Result<Node, PersistenceError> {
    let mut node = node_from_start(start)?;
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(child) => {
                let name = element_name(&child)?;
                match value_kind(&name) {
                    Some(option_type) => {
                        let value = read_value(reader, &child, option_type, false)?;
                        attach_value(&mut node, value)?;
                    }
                    None => {
                        let child = read_node(reader, &child)?;
                        node.push_child(child);
                    }
                }
            }
            Event::Empty(child) => {
                let name = element_name(&child)?;
                match value_kind(&name) {
                    Some(option_type) => {
                        let value = read_value(reader, &child, option_type, true)?;
                        attach_value(&mut node, value)?;
                    }
                    None => {
                        node.push_child(node_from_start(&child)?);
                    }
                }
            }
            Event::End(_) => return Ok(node),
            Event::Text(text) if is_blank(&text) => {}
            Event::Comment(_) | Event::PI(_) => {}
            Event::Eof => {
                return Err(invalid(format!(
                    "document ends inside element '{}'",
                    node.name()
                )));
            }
            _ => {
                return Err(invalid(format!(
                    "unexpected content inside element '{}'",
                    node.name()
                )));
            }
        }
    }
}

/// Collects the text of an `item` element.
fn read_item(reader: &mut XmlReader<'_>) -> Result<String, PersistenceError> {
    let mut text = String::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Text(part) => text.push_str(&part.unescape().map_err(xml_error)?),
            Event::CData(part) => text.push_str(std::str::from_utf8(&part).map_err(xml_error)?),
            Event::End(_) => return Ok(text),
            Event::Comment(_) => {}
            Event::Eof => return Err(invalid("document ends inside an item")),
            _ => return Err(invalid("items may only contain text")),
        }
    }
}

fn parse_rank(start: &BytesStart<'_>) -> Result<Rank, PersistenceError> {
    let Some(text) = attribute_value(start, "rank")? else {
        return Ok(Rank::Scalar);
    };
    text.trim()
        .parse::<i32>()
        .ok()
        .and_then(Rank::from_code)
        .ok_or_else(|| invalid(format!("unsupported rank '{text}'")))
}

fn parse_shape(
    start: &BytesStart<'_>,
    rank: Rank,
    len: usize,
) -> Result<Shape, PersistenceError> {
    let dims = match attribute_value(start, "shape")? {
        Some(text) => text
            .split_whitespace()
            .map(|dim| {
                dim.parse::<usize>()
                    .map_err(|_| invalid(format!("bad shape '{text}'")))
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    match (rank, dims.as_slice()) {
        (Rank::Scalar, []) => Ok(Shape::new(1, 1)),
        (Rank::Vector, []) => Ok(Shape::new(len, 1)),
        (Rank::Vector, [rows]) => Ok(Shape::new(*rows, 1)),
        (Rank::Matrix, [rows, cols]) => Ok(Shape::new(*rows, *cols)),
        _ => Err(invalid(format!(
            "shape {dims:?} does not fit a rank {rank} value"
        ))),
    }
}

fn parse_numbers<T>(text: &str) -> Result<Vec<T>, PersistenceError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|e| invalid(format!("bad number '{token}': {e}")))
        })
        .collect()
}

fn shaped<T>(rank: Rank, shape: Shape, data: Vec<T>) -> Result<Shaped<T>, PersistenceError> {
    Shaped::from_elements(rank, shape, data).map_err(|e| invalid(e.to_string()))
}

fn read_value(
    reader: &mut XmlReader<'_>,
    start: &BytesStart<'_>,
    option_type: OptionType,
    empty: bool,
) -> Result<Value, PersistenceError> {
    let mut text = String::new();
    let mut items = Vec::new();

    if !empty {
        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Text(part) => text.push_str(&part.unescape().map_err(xml_error)?),
                Event::CData(part) => {
                    text.push_str(std::str::from_utf8(&part).map_err(xml_error)?)
                }
                Event::Start(item) if element_name(&item)? == ITEM_ELEMENT => {
                    items.push(read_item(reader)?)
                }
                Event::Empty(item) if element_name(&item)? == ITEM_ELEMENT => {
                    items.push(String::new())
                }
                Event::End(_) => break,
                Event::Comment(_) => {}
                Event::Eof => return Err(invalid("document ends inside a value")),
                _ => return Err(invalid("unexpected element inside a value")),
            }
        }
    }

    let rank = parse_rank(start)?;
    let value = match option_type {
        OptionType::Integer | OptionType::Double if !items.is_empty() => {
            return Err(invalid("numeric values cannot contain items"));
        }
        OptionType::Integer => {
            let data = parse_numbers::<i64>(&text)?;
            let shape = parse_shape(start, rank, data.len())?;
            Value::Integer(shaped(rank, shape, data)?)
        }
        OptionType::Double => {
            let data = parse_numbers::<f64>(&text)?;
            let shape = parse_shape(start, rank, data.len())?;
            Value::Double(shaped(rank, shape, data)?)
        }
        OptionType::String if rank == Rank::Scalar => {
            if !items.is_empty() {
                return Err(invalid("a rank 0 string cannot contain items"));
            }
            Value::String(Shaped::Scalar(text))
        }
        OptionType::String => {
            if !is_blank(text.as_bytes()) {
                return Err(invalid("string arrays must list their entries as items"));
            }
            let shape = parse_shape(start, rank, items.len())?;
            Value::String(shaped(rank, shape, items)?)
        }
    };
    Ok(value)
}

/// Parses a tree from XML text.
pub fn from_str(text: &str) -> Result<OptionStore, PersistenceError> {
    let mut reader = Reader::from_str(text);

    let root = loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => break read_node(&mut reader, &start)?,
            Event::Empty(start) => break node_from_start(&start)?,
            Event::Text(text) if is_blank(&text) => {}
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => return Err(invalid("document has no root element")),
            _ => return Err(invalid("unexpected content before the root element")),
        }
    };

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Eof => break,
            Event::Text(text) if is_blank(&text) => {}
            Event::Comment(_) | Event::PI(_) => {}
            _ => return Err(invalid("unexpected content after the root element")),
        }
    }

    validate_tree(&root)?;
    tracing::trace!(root = root.name(), "Parsed XML options document");
    Ok(OptionStore::from_root(root))
}
