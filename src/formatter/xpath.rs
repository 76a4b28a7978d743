//! XML fragment formatting.
//!
//! The unit of exchange on the XML path is one fragment: the outer XML of a
//! repeating row element selected by an XPath. Reading derives table columns
//! from the fragment's leaf elements and attributes; writing synthesizes a
//! fragment per row from (column -> XPath) mappings.
//!
//! Column names follow a naming convention mirrored in both directions:
//! the hierarchy separator (default `_`) joins nested element names, and
//! the attribute marker (default `$`) prefixes attribute names. So
//! `<book page="7"><author><name>X</name></author></book>` yields the
//! columns `$page` and `author_name`, and those column names regenerate the
//! same shape on write.

use crate::error::{Result, RowlinkError};
use crate::table::{DataSet, DataType, Table, Value};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// One namespace prefix binding used when matching XPath steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNamespace {
    pub prefix: String,
    pub uri: String,
}

/// Maps one table column onto an XPath relative to the row element, e.g.
/// `("author_name", "/row/author/name")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPathMapping {
    pub column: String,
    pub xpath: String,
}

/// Decodes the five predefined XML entities plus numeric character
/// references (`&#NNN;`, `&#xHH;`). Unknown references pass through
/// verbatim.
pub fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            out.push_str(rest);
            return out;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "amp" => Some('&'),
            _ => entity
                .strip_prefix('#')
                .and_then(|num| {
                    num.strip_prefix('x')
                        .or_else(|| num.strip_prefix('X'))
                        .map_or_else(|| num.parse::<u32>().ok(), |hex| u32::from_str_radix(hex, 16).ok())
                })
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parses XML fragments into tables of a [`DataSet`].
pub struct XPathReadFormatter {
    pub hierarchy_separator: String,
    pub attribute_marker: String,
}

impl Default for XPathReadFormatter {
    fn default() -> Self {
        XPathReadFormatter {
            hierarchy_separator: "_".into(),
            attribute_marker: "$".into(),
        }
    }
}

impl XPathReadFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    fn column_for(&self, stack: &[String], attribute: Option<&str>) -> String {
        let path = stack[1..].join(&self.hierarchy_separator);
        match attribute {
            Some(attr) => {
                if path.is_empty() {
                    format!("{}{attr}", self.attribute_marker)
                } else {
                    format!("{path}{}{}{attr}", self.hierarchy_separator, self.attribute_marker)
                }
            }
            None => {
                if path.is_empty() {
                    // text directly under the row element
                    stack[0].clone()
                } else {
                    path
                }
            }
        }
    }

    /// Parses one fragment and appends its row to the matching table of
    /// `data_set` (created on first use, named after the fragment's root
    /// element). Repeated leaf values within one fragment are joined with
    /// `#`, the writer's multi-value separator.
    pub fn parse_fragment(&self, xml: &str, data_set: &mut DataSet) -> Result<()> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<String> = Vec::new();
        let mut root_name: Option<String> = None;
        let mut pairs: Vec<(String, String)> = Vec::new();
        // text of the current element, accumulated across the text and
        // reference events it splits into
        let mut text = String::new();

        let record = |column: String, value: String, pairs: &mut Vec<(String, String)>| {
            if let Some(existing) = pairs.iter_mut().find(|(c, _)| *c == column) {
                existing.1.push('#');
                existing.1.push_str(&value);
            } else {
                pairs.push((column, value));
            }
        };

        let flush_text =
            |stack: &[String], text: &mut String, pairs: &mut Vec<(String, String)>| {
                let trimmed = text.trim();
                if !trimmed.is_empty() && !stack.is_empty() {
                    record(self.column_for(stack, None), unescape_xml(trimmed), pairs);
                }
                text.clear();
            };

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    flush_text(&stack, &mut text, &mut pairs);
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    if root_name.is_none() {
                        root_name = stack.first().cloned();
                    }
                    for attr in e.attributes() {
                        let attr = attr.map_err(|err| {
                            RowlinkError::Configuration(format!("bad xml attribute: {err}"))
                        })?;
                        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                        let value = unescape_xml(&String::from_utf8_lossy(&attr.value));
                        record(self.column_for(&stack, Some(&key)), value, &mut pairs);
                    }
                }
                Event::Empty(e) => {
                    flush_text(&stack, &mut text, &mut pairs);
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    if root_name.is_none() {
                        root_name = stack.first().cloned();
                    }
                    for attr in e.attributes() {
                        let attr = attr.map_err(|err| {
                            RowlinkError::Configuration(format!("bad xml attribute: {err}"))
                        })?;
                        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                        let value = unescape_xml(&String::from_utf8_lossy(&attr.value));
                        record(self.column_for(&stack, Some(&key)), value, &mut pairs);
                    }
                    stack.pop();
                }
                Event::Text(t) => {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
                // re-wrap references so the entity decoder sees `&...;`
                Event::GeneralRef(r) => {
                    text.push('&');
                    text.push_str(&String::from_utf8_lossy(&r));
                    text.push(';');
                }
                Event::End(_) => {
                    flush_text(&stack, &mut text, &mut pairs);
                    if stack.len() > 1 {
                        stack.pop();
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let Some(root) = root_name else {
            return Ok(());
        };

        let table = data_set.get_or_insert(&root);
        for (column, _) in &pairs {
            table.add_column(column.clone(), DataType::Text);
        }
        let mut row = table.new_row();
        for (column, value) in pairs {
            if let Some(idx) = table.column_index(&column) {
                row.set(idx, Value::Text(value));
            }
        }
        table.add_row(row)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn new(name: &str) -> Self {
        XmlNode { name: name.to_string(), ..Default::default() }
    }

    /// Gets or creates the child of that name (paths that share a prefix
    /// share the node).
    fn child_mut(&mut self, name: &str) -> &mut XmlNode {
        if let Some(pos) = self.children.iter().position(|c| c.name == name) {
            return &mut self.children[pos];
        }
        self.children.push(XmlNode::new(name));
        self.children.last_mut().unwrap()
    }

    fn push_child(&mut self, name: &str) -> &mut XmlNode {
        self.children.push(XmlNode::new(name));
        self.children.last_mut().unwrap()
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attrs {
            start.push_attribute((k.as_str(), v.as_str()));
        }
        if self.children.is_empty() && self.text.is_none() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        writer.write_event(Event::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

/// Renders table rows as XML fragments.
pub struct XPathWriteFormatter {
    pub hierarchy_separator: String,
    pub attribute_marker: String,
    /// Explicit column mappings; auto-detected from the column names when
    /// empty.
    pub mappings: Vec<XPathMapping>,
    /// Root element of every generated fragment.
    pub row_element: String,
}

impl Default for XPathWriteFormatter {
    fn default() -> Self {
        XPathWriteFormatter {
            hierarchy_separator: "_".into(),
            attribute_marker: "$".into(),
            mappings: Vec::new(),
            row_element: "row".into(),
        }
    }
}

impl XPathWriteFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an XPath from a column name, e.g. with row element `book`:
    /// `"author_name"` -> `/book/author/name`, `"$page"` -> `/book/@page`.
    fn xpath_from_column_name(&self, column: &str) -> String {
        let (left, right) = match column.find(&self.attribute_marker) {
            Some(i) => (&column[..i], &column[i..]),
            None => (column, ""),
        };
        let left = left
            .trim_matches(|c: char| self.hierarchy_separator.starts_with(c))
            .replace(&self.hierarchy_separator, "/");
        let right = right.replace(&self.attribute_marker, "@");
        let mut xpath = String::from("/");
        xpath.push_str(&self.row_element);
        if !left.is_empty() {
            xpath.push('/');
            xpath.push_str(&left);
        }
        if !right.is_empty() {
            if !xpath.ends_with('/') {
                xpath.push('/');
            }
            xpath.push_str(&right);
        }
        xpath
    }

    fn ensure_mappings(&mut self, table: &Table) {
        if !self.mappings.is_empty() {
            return;
        }
        for column in table.columns() {
            self.mappings.push(XPathMapping {
                column: column.name.clone(),
                xpath: self.xpath_from_column_name(&column.name),
            });
        }
    }

    /// Renders one fragment string per row.
    pub fn render_rows(&mut self, table: &Table) -> Result<Vec<String>> {
        self.ensure_mappings(table);

        let mut fragments = Vec::with_capacity(table.row_count());
        for row in table.rows() {
            let mut root = XmlNode::new(&self.row_element);

            for mapping in &self.mappings {
                let Some(col) = table.column_index(&mapping.column) else {
                    continue;
                };
                let value = match row.get(col) {
                    Some(Value::Null) | None => continue,
                    Some(v) => v.render(),
                };

                let parts: Vec<&str> = mapping
                    .xpath
                    .split('/')
                    .filter(|p| !p.is_empty())
                    .collect();
                // paths are relative to the row element
                let rel: &[&str] = match parts.first() {
                    Some(first) if *first == self.row_element => &parts[1..],
                    _ => &parts[..],
                };
                self.apply_path(&mut root, rel, &value);
            }

            let mut writer = Writer::new(Vec::new());
            root.write_to(&mut writer)?;
            fragments.push(String::from_utf8_lossy(&writer.into_inner()).into_owned());
        }
        Ok(fragments)
    }

    fn apply_path(&self, root: &mut XmlNode, parts: &[&str], value: &str) {
        match parts {
            [] => root.text = Some(value.to_string()),
            [attr] if attr.starts_with('@') => {
                root.attrs.push((attr[1..].to_string(), value.to_string()));
            }
            [leaf] => {
                // multi-values become repeated sibling elements
                let sub_values: Vec<&str> = value.split('#').collect();
                if sub_values.len() > 1 {
                    for sub in sub_values {
                        root.push_child(leaf).text = Some(sub.to_string());
                    }
                } else {
                    root.child_mut(leaf).text = Some(value.to_string());
                }
            }
            [head, rest @ ..] => {
                self.apply_path(root.child_mut(head), rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;

    #[test]
    fn fragment_columns_follow_naming_convention() {
        let formatter = XPathReadFormatter::new();
        let mut ds = DataSet::new();
        formatter
            .parse_fragment(
                r#"<book page="7"><title>Faust</title><author><name>Goethe</name></author></book>"#,
                &mut ds,
            )
            .unwrap();

        let t = &ds.tables[0];
        assert_eq!(t.name, "book");
        assert_eq!(t.column_names(), vec!["$page", "title", "author_name"]);
        assert_eq!(t.value(0, "author_name"), Some(&Value::Text("Goethe".into())));
    }

    #[test]
    fn character_and_entity_references_decode_into_text() {
        let formatter = XPathReadFormatter::new();
        let mut ds = DataSet::new();
        formatter
            .parse_fragment("<book><author>B&#252;chner &amp; Co</author></book>", &mut ds)
            .unwrap();
        assert_eq!(
            ds.tables[0].value(0, "author"),
            Some(&Value::Text("Büchner & Co".into()))
        );
    }

    #[test]
    fn repeated_leaves_join_with_hash() {
        let formatter = XPathReadFormatter::new();
        let mut ds = DataSet::new();
        formatter
            .parse_fragment("<book><tag>a</tag><tag>b</tag></book>", &mut ds)
            .unwrap();
        assert_eq!(ds.tables[0].value(0, "tag"), Some(&Value::Text("a#b".into())));
    }

    #[test]
    fn write_regenerates_structure_from_column_names() {
        let mut formatter = XPathWriteFormatter { row_element: "book".into(), ..Default::default() };
        let mut t = Table::new("book");
        t.add_column("$page", DataType::Text);
        t.add_column("title", DataType::Text);
        t.add_column("author_name", DataType::Text);
        t.add_row(Row(vec!["7".into(), "Faust".into(), "Goethe".into()])).unwrap();

        let fragments = formatter.render_rows(&t).unwrap();
        assert_eq!(
            fragments,
            vec![r#"<book page="7"><title>Faust</title><author><name>Goethe</name></author></book>"#]
        );
    }

    #[test]
    fn roundtrip_through_fragment() {
        let read = XPathReadFormatter::new();
        let mut write = XPathWriteFormatter { row_element: "book".into(), ..Default::default() };

        let xml = r#"<book page="7"><title>Faust</title></book>"#;
        let mut ds = DataSet::new();
        read.parse_fragment(xml, &mut ds).unwrap();
        let fragments = write.render_rows(&ds.tables[0]).unwrap();
        assert_eq!(fragments, vec![xml.to_string()]);
    }

    #[test]
    fn multi_value_cell_becomes_sibling_elements() {
        let mut formatter = XPathWriteFormatter::new();
        let mut t = Table::new("t");
        t.add_column("tag", DataType::Text);
        t.add_row(Row(vec!["a#b".into()])).unwrap();
        let fragments = formatter.render_rows(&t).unwrap();
        assert_eq!(fragments, vec!["<row><tag>a</tag><tag>b</tag></row>"]);
    }
}
