//! XML file adapter.
//!
//! Reading streams the document once, capturing each element whose path
//! matches the row XPath as a fragment and handing it to the
//! [`XPathReadFormatter`]. Writing renders one fragment per row and appends
//! the fragments under the row XPath's parent path: into a fresh document
//! with the missing ancestor elements created, or spliced into an existing
//! document just before the parent element closes.

use crate::convert::{ConvertDirection, ConvertProcessor};
use crate::error::{Result, RowlinkError};
use crate::fields::Field;
use crate::formatter::{XPathReadFormatter, XPathWriteFormatter, XmlNamespace};
use crate::table::{DataSet, Table};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Reader, Writer};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use tracing::debug;

use super::{Blocks, DataReader, DataWriter, FileConnection};

/// Streams rows of an XML document selected by an XPath of element steps
/// (e.g. `/books/book`). With an empty namespace list, steps match on local
/// names alone. When bindings are configured (or were collected from the
/// root by an earlier read), a prefixed step matches only elements bound to
/// that prefix's URI, and an unprefixed step matches the default binding
/// or, without one, elements in no namespace. The same list is re-declared
/// when a new document is created on write.
pub struct XmlAdapter {
    pub connection: FileConnection,
    row_xpath: String,
    pub read_formatter: XPathReadFormatter,
    pub write_formatter: XPathWriteFormatter,
    pub namespaces: Vec<XmlNamespace>,
    pub read_converter: ConvertProcessor,
    pub write_converter: ConvertProcessor,
}

fn local_part(step: &str) -> &str {
    step.rsplit(':').next().unwrap_or(step)
}

impl XmlAdapter {
    pub fn new(path: impl Into<PathBuf>, row_xpath: impl Into<String>) -> Self {
        let row_xpath = row_xpath.into();
        let mut write_formatter = XPathWriteFormatter::new();
        if let Some(last) = row_xpath.split('/').filter(|s| !s.is_empty()).next_back() {
            write_formatter.row_element = local_part(last).to_string();
        }
        XmlAdapter {
            connection: FileConnection::new(path),
            row_xpath,
            read_formatter: XPathReadFormatter::new(),
            write_formatter,
            namespaces: Vec::new(),
            read_converter: ConvertProcessor::new(ConvertDirection::Read),
            write_converter: ConvertProcessor::new(ConvertDirection::Write),
        }
    }

    pub fn row_xpath(&self) -> &str {
        &self.row_xpath
    }

    /// Local-name steps of the row XPath.
    fn segments(&self) -> Vec<String> {
        self.row_xpath
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| local_part(s).to_string())
            .collect()
    }

    /// Row XPath steps with their prefixes resolved against the namespace
    /// list. A prefix without a binding is a configuration error; with an
    /// empty list every step carries no URI and matching falls back to
    /// local names.
    fn resolved_steps(&self) -> Result<Vec<XPathStep>> {
        self.row_xpath
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|step| {
                let (prefix, local) = match step.split_once(':') {
                    Some((p, l)) => (Some(p), l),
                    None => (None, step),
                };
                let uri = match prefix {
                    _ if self.namespaces.is_empty() => None,
                    Some(p) => Some(
                        self.namespaces
                            .iter()
                            .find(|ns| ns.prefix == p)
                            .ok_or_else(|| {
                                RowlinkError::Configuration(format!(
                                    "xpath prefix '{p}' has no namespace binding"
                                ))
                            })?
                            .uri
                            .clone(),
                    ),
                    // unprefixed steps take the default binding; without
                    // one they match elements in no namespace
                    None => self
                        .namespaces
                        .iter()
                        .find(|ns| ns.prefix.is_empty())
                        .map(|ns| ns.uri.clone()),
                };
                Ok(XPathStep { local: local.to_string(), uri })
            })
            .collect()
    }

    fn open_fragments(&self) -> Result<XmlFragments> {
        let steps = self.resolved_steps()?;
        if steps.is_empty() {
            return Err(RowlinkError::Configuration(
                "xml row xpath must name at least one element".into(),
            ));
        }
        let file = File::open(&self.connection.path)?;
        Ok(XmlFragments {
            reader: NsReader::from_reader(BufReader::new(file)),
            buf: Vec::new(),
            steps,
            match_uris: !self.namespaces.is_empty(),
            stack: Vec::new(),
            root_namespaces: Vec::new(),
        })
    }
}

/// One resolved step of the row XPath.
struct XPathStep {
    local: String,
    /// Namespace URI the step's element must be bound to; `None` means
    /// no-namespace when bindings are in effect.
    uri: Option<String>,
}

/// Streams the raw outer XML of every row-path match in document order.
struct XmlFragments {
    reader: NsReader<BufReader<File>>,
    buf: Vec<u8>,
    steps: Vec<XPathStep>,
    match_uris: bool,
    /// Open elements as (local name, bound namespace URI).
    stack: Vec<(String, Option<String>)>,
    root_namespaces: Vec<XmlNamespace>,
}

fn bound_uri(resolution: ResolveResult<'_>) -> Option<String> {
    match resolution {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.into_inner()).into_owned()),
        _ => None,
    }
}

fn path_matches(
    stack: &[(String, Option<String>)],
    steps: &[XPathStep],
    match_uris: bool,
) -> bool {
    stack.len() == steps.len()
        && stack
            .iter()
            .zip(steps)
            .all(|((local, uri), step)| *local == step.local && (!match_uris || *uri == step.uri))
}

fn collect_namespaces(start: &BytesStart<'_>, into: &mut Vec<XmlNamespace>) {
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let uri = String::from_utf8_lossy(&attr.value).into_owned();
        if key == "xmlns" {
            into.push(XmlNamespace { prefix: String::new(), uri });
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            into.push(XmlNamespace { prefix: prefix.to_string(), uri });
        }
    }
}

impl XmlFragments {
    fn next_fragment(&mut self) -> Result<Option<String>> {
        let mut capture: Option<(Writer<Vec<u8>>, usize)> = None;
        loop {
            self.buf.clear();
            let (resolution, event) = self.reader.read_resolved_event_into(&mut self.buf)?;
            match event {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    if self.stack.is_empty() {
                        collect_namespaces(&e, &mut self.root_namespaces);
                    }
                    self.stack.push((name, bound_uri(resolution)));
                    if let Some((writer, depth)) = &mut capture {
                        writer.write_event(Event::Start(e))?;
                        *depth += 1;
                    } else if path_matches(&self.stack, &self.steps, self.match_uris) {
                        let mut writer = Writer::new(Vec::new());
                        writer.write_event(Event::Start(e))?;
                        capture = Some((writer, 1));
                    }
                }
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    if let Some((writer, _)) = &mut capture {
                        writer.write_event(Event::Empty(e))?;
                    } else {
                        self.stack.push((name, bound_uri(resolution)));
                        let is_row = path_matches(&self.stack, &self.steps, self.match_uris);
                        self.stack.pop();
                        if is_row {
                            let mut writer = Writer::new(Vec::new());
                            writer.write_event(Event::Empty(e))?;
                            let bytes = writer.into_inner();
                            return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
                        }
                    }
                }
                Event::End(e) => {
                    if let Some((writer, depth)) = &mut capture {
                        writer.write_event(Event::End(e))?;
                        *depth -= 1;
                        if *depth == 0 {
                            let (writer, _) = capture.take().unwrap();
                            self.stack.pop();
                            let bytes = writer.into_inner();
                            return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
                        }
                    }
                    self.stack.pop();
                }
                Event::Text(e) => {
                    if let Some((writer, _)) = &mut capture {
                        writer.write_event(Event::Text(e))?;
                    }
                }
                Event::CData(e) => {
                    if let Some((writer, _)) = &mut capture {
                        writer.write_event(Event::CData(e))?;
                    }
                }
                // entity and character references arrive as their own
                // events; the fragment keeps them verbatim
                Event::GeneralRef(e) => {
                    if let Some((writer, _)) = &mut capture {
                        writer.write_event(Event::GeneralRef(e))?;
                    }
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

/// Block cursor over the matched fragments.
pub struct XmlBlocks<'a> {
    fragments: XmlFragments,
    formatter: &'a XPathReadFormatter,
    converter: &'a ConvertProcessor,
    namespaces: &'a mut Vec<XmlNamespace>,
    block_size: Option<usize>,
    template: Option<Table>,
    done: bool,
}

impl XmlBlocks<'_> {
    fn next_block(&mut self) -> Result<Option<Table>> {
        let mut data_set = DataSet::new();
        if let Some(template) = &self.template {
            data_set.tables.push(template.clone_schema());
        }

        let mut collected = 0usize;
        loop {
            match self.fragments.next_fragment()? {
                Some(fragment) => {
                    self.formatter.parse_fragment(&fragment, &mut data_set)?;
                    collected += 1;
                    if let Some(limit) = self.block_size
                        && collected >= limit
                    {
                        break;
                    }
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if self.namespaces.is_empty() {
            *self.namespaces = self.fragments.root_namespaces.clone();
        }
        if collected == 0 {
            return Ok(None);
        }

        let Some(mut table) = data_set.tables.into_iter().next() else {
            return Ok(None);
        };
        if self.template.is_none() {
            self.template = Some(table.clone_schema());
        }
        self.converter.apply_table(&mut table)?;
        debug!(rows = table.row_count(), table = %table.name, "emitting xml block");
        Ok(Some(table))
    }
}

impl Iterator for XmlBlocks<'_> {
    type Item = Result<Table>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_block() {
            Ok(Some(table)) => Some(Ok(table)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl DataReader for XmlAdapter {
    fn read_blocks(&mut self, block_size: Option<usize>) -> Result<Blocks<'_>> {
        let fragments = self.open_fragments()?;
        Ok(Box::new(XmlBlocks {
            fragments,
            formatter: &self.read_formatter,
            converter: &self.read_converter,
            namespaces: &mut self.namespaces,
            block_size,
            template: None,
            done: false,
        }))
    }

    fn count(&mut self) -> Result<usize> {
        let mut fragments = self.open_fragments()?;
        let mut n = 0usize;
        while fragments.next_fragment()?.is_some() {
            n += 1;
        }
        Ok(n)
    }

    fn available_columns(&mut self) -> Result<Vec<Field>> {
        let mut fragments = self.open_fragments()?;
        let Some(fragment) = fragments.next_fragment()? else {
            return Ok(Vec::new());
        };
        let mut data_set = DataSet::new();
        self.read_formatter.parse_fragment(&fragment, &mut data_set)?;
        Ok(data_set
            .tables
            .first()
            .map(|t| {
                t.columns()
                    .iter()
                    .map(|c| Field::new(c.name.clone()).typed(c.data_type))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Distinct element paths of the document, `/`-joined from the root.
    fn available_tables(&mut self) -> Result<Vec<String>> {
        let file = File::open(&self.connection.path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        let mut buf = Vec::new();
        let mut stack: Vec<String> = Vec::new();
        let mut paths: Vec<String> = Vec::new();

        loop {
            buf.clear();
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    let path = format!("/{}", stack.join("/"));
                    if !paths.contains(&path) {
                        paths.push(path);
                    }
                }
                Event::Empty(e) => {
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    let path = format!("/{}", stack.join("/"));
                    if !paths.contains(&path) {
                        paths.push(path);
                    }
                    stack.pop();
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(paths)
    }
}

impl DataWriter for XmlAdapter {
    fn write_blocks(
        &mut self,
        blocks: &mut dyn Iterator<Item = Table>,
        delete_before: bool,
    ) -> Result<()> {
        let segments = self.segments();
        if segments.len() < 2 {
            return Err(RowlinkError::Configuration(
                "xml row xpath must nest the row element under a document root".into(),
            ));
        }
        let ancestors = &segments[..segments.len() - 1];
        self.write_formatter.row_element = segments.last().cloned().unwrap_or_default();

        let mut fragments: Vec<String> = Vec::new();
        for mut table in blocks {
            self.write_converter.apply_table(&mut table)?;
            fragments.extend(self.write_formatter.render_rows(&table)?);
        }

        let path = self.connection.path.clone();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        if delete_before && path.exists() {
            fs::remove_file(&path)?;
        }

        let bytes = if path.exists() {
            self.splice_into_existing(&path, ancestors, &fragments)?
        } else {
            self.build_new_document(ancestors, &fragments)?
        };
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), fragments = fragments.len(), "wrote xml destination");
        Ok(())
    }
}

impl XmlAdapter {
    fn build_new_document(&self, ancestors: &[String], fragments: &[String]) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        for (i, ancestor) in ancestors.iter().enumerate() {
            let mut start = BytesStart::new(ancestor.as_str());
            if i == 0 {
                for ns in &self.namespaces {
                    let key = if ns.prefix.is_empty() {
                        "xmlns".to_string()
                    } else {
                        format!("xmlns:{}", ns.prefix)
                    };
                    start.push_attribute((key.as_str(), ns.uri.as_str()));
                }
            }
            writer.write_event(Event::Start(start))?;
        }
        for fragment in fragments {
            writer.get_mut().extend_from_slice(fragment.as_bytes());
        }
        for ancestor in ancestors.iter().rev() {
            writer.write_event(Event::End(BytesEnd::new(ancestor.as_str())))?;
        }
        Ok(writer.into_inner())
    }

    /// Copies the existing document event by event, inserting the fragments
    /// just before the row container's closing tag.
    fn splice_into_existing(
        &self,
        path: &std::path::Path,
        ancestors: &[String],
        fragments: &[String],
    ) -> Result<Vec<u8>> {
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        let mut writer = Writer::new(Vec::new());
        let mut buf = Vec::new();
        let mut stack: Vec<String> = Vec::new();
        let mut inserted = false;

        loop {
            buf.clear();
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    writer.write_event(Event::Start(e))?;
                }
                Event::End(e) => {
                    if !inserted && stack == ancestors {
                        for fragment in fragments {
                            writer.get_mut().extend_from_slice(fragment.as_bytes());
                        }
                        inserted = true;
                    }
                    stack.pop();
                    writer.write_event(Event::End(e))?;
                }
                Event::Eof => break,
                event => writer.write_event(event)?,
            }
        }

        if !inserted {
            return Err(RowlinkError::Configuration(format!(
                "container element '/{}' not found in existing document",
                ancestors.join("/")
            )));
        }
        Ok(writer.into_inner())
    }
}
