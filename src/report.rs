use crate::parsers::{
    blend::RawBlend,
    field::UNSIZED,
    PointerSize,
};
use std::fmt::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    pub type_name: String,
    /// Whether `type_name` is itself a struct of the file.
    pub type_is_struct: bool,
    pub clean_name: String,
    pub raw_name: String,
    pub array_dimensions: Vec<i64>,
    pub is_pointer: bool,
    /// Size of the field's type.
    pub size: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructReport {
    /// Index of the struct's type in the type table.
    pub id: usize,
    pub name: String,
    pub size: usize,
    pub fields: Vec<FieldReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReport {
    pub code: String,
    pub type_name: String,
    pub count: usize,
    pub size: usize,
    pub offset: usize,
    pub memory_address: u64,
}

/// A read-only listing of everything the loader found in a file: every struct layout of the DNA and every block with
/// the struct it is bound to. Print it (`Display`) or save it as a web page (`Report::to_html`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub version: String,
    pub pointer_size: PointerSize,
    pub structs: Vec<StructReport>,
    pub blocks: Vec<BlockReport>,
}

impl Report {
    /// Blocks bound to a struct named in `denylist` are left out of `Report::blocks`.
    pub fn new(blend: &RawBlend, denylist: &[String]) -> Report {
        let dna = &blend.dna;

        let structs = dna
            .structs
            .iter()
            .map(|s| {
                let r#type = dna.struct_type(s);
                StructReport {
                    id: r#type.id,
                    name: r#type.name.clone(),
                    size: r#type.bytes_len,
                    fields: s
                        .fields
                        .iter()
                        .map(|field| {
                            let field_type = &dna.types[field.type_index];
                            let name = &dna.names[field.name_index];
                            FieldReport {
                                type_name: field_type.name.clone(),
                                type_is_struct: dna.struct_by_type_index(field.type_index).is_some(),
                                clean_name: name.clean_name.clone(),
                                raw_name: name.raw.clone(),
                                array_dimensions: name.array_dimensions.clone(),
                                is_pointer: name.is_pointer(),
                                size: field_type.bytes_len,
                                offset: field.offset,
                            }
                        })
                        .collect(),
                }
            })
            .collect();

        let blocks = blend
            .blocks
            .iter()
            .filter_map(|block| {
                let r#struct = dna.structs.get(block.dna_index)?;
                let type_name = &dna.struct_type(r#struct).name;
                if denylist.iter().any(|denied| denied == type_name) {
                    return None;
                }
                Some(BlockReport {
                    code: block.code.clone(),
                    type_name: type_name.clone(),
                    count: block.count,
                    size: block.size,
                    offset: block.offset,
                    memory_address: block.memory_address,
                })
            })
            .collect();

        Report {
            version: blend.header.version.clone(),
            pointer_size: blend.header.pointer_size,
            structs,
            blocks,
        }
    }

    fn pointer_type(&self) -> &'static str {
        match self.pointer_size {
            PointerSize::Bits32 => "unsigned int",
            PointerSize::Bits64 => "unsigned long",
        }
    }

    /// Renders the report as a standalone HTML page. Field types that are structs link to their definition.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        // Writing to a String can't fail
        let _ = self.write_html(&mut html);
        html
    }

    fn write_html(&self, html: &mut String) -> fmt::Result {
        writeln!(html, "<html><head><title>blend file structure</title>")?;
        writeln!(html, "<style type=\"text/css\">")?;
        writeln!(html, "html,body{{font-family:monospace}}")?;
        writeln!(html, "a{{color: #000;}}")?;
        writeln!(html, "h2{{padding:0;margin: 20px 0 5px 0;}}")?;
        writeln!(html, "h3{{padding:0;margin: 10px 0 5px 0;}}")?;
        writeln!(html, "h3.type{{font-weight:normal;}}")?;
        writeln!(
            html,
            "th,td{{text-align:left;padding: 7px;border-bottom:1px solid #ccc;margin:0;}}"
        )?;
        writeln!(html, "td.center, th.center{{text-align:center;}}")?;
        writeln!(html, "</style></head><body>")?;

        writeln!(html, "<h2>File info</h2>")?;
        writeln!(html, "<h3>version</h3> {}", escape(&self.version))?;
        writeln!(html, "<h3>pointer type</h3> {}", self.pointer_type())?;

        writeln!(html, "<h2>Structures (Size)</h2>")?;
        for s in &self.structs {
            writeln!(
                html,
                "<h3 class='type'><a id=\"{name}\">{} <b>{name}</b> ({})</a></h3>",
                s.id,
                s.size,
                name = escape(&s.name)
            )?;
            writeln!(html, "<table cellspacing='0'><tr><th>TYPE</th><th>NAME CLEAN</th><th>NAME</th><th class='center'>[]</th><th class='center'>*</th><th>SIZE</th><th>OFFSET</th></tr>")?;
            for field in &s.fields {
                let type_name = escape(&field.type_name);
                let type_cell = if field.type_is_struct {
                    format!("<a href=\"#{0}\">{0}</a>", type_name)
                } else {
                    type_name
                };
                writeln!(
                    html,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td class='center'>{}</td><td class='center'>{}</td><td>{}</td><td>{}</td></tr>",
                    type_cell,
                    escape(&field.clean_name),
                    escape(&field.raw_name),
                    dimensions(&field.array_dimensions),
                    if field.is_pointer { "&#10003;" } else { "" },
                    field.size,
                    field.offset
                )?;
            }
            writeln!(html, "</table><br />")?;
        }

        writeln!(html, "<h2>Blocks</h2>")?;
        writeln!(html, "<table cellspacing='0'><tr><th>NAME</th><th>TYPE</th><th>COUNT</th><th>SIZE</th><th>OFFSET</th><th>OLD ADDRESS</th></tr>")?;
        for block in &self.blocks {
            writeln!(
                html,
                "<tr><td>{}</td><td><a href=\"#{type_name}\">{type_name}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&block.code),
                block.count,
                block.size,
                block.offset,
                block.memory_address,
                type_name = escape(&block.type_name)
            )?;
        }
        writeln!(html, "</table>")?;
        writeln!(html, "</body></html>")
    }
}

fn dimensions(array_dimensions: &[i64]) -> String {
    if array_dimensions.is_empty() {
        return String::new();
    }
    let dims: Vec<String> = array_dimensions
        .iter()
        .map(|&d| if d == UNSIZED { String::from("?") } else { d.to_string() })
        .collect();
    format!("[{}]", dims.join(","))
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "pointer type: {}", self.pointer_type())?;

        writeln!(f)?;
        writeln!(f, "structures:")?;
        for s in &self.structs {
            writeln!(f, "{} {} ({})", s.id, s.name, s.size)?;
            for field in &s.fields {
                writeln!(
                    f,
                    "    {:>6} {:<24} {:<24} {:<10} {:<3} {:>6} {}",
                    field.offset,
                    field.type_name,
                    field.clean_name,
                    dimensions(&field.array_dimensions),
                    if field.is_pointer { "*" } else { "" },
                    field.size,
                    field.raw_name,
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "blocks:")?;
        for block in &self.blocks {
            writeln!(
                f,
                "{:<4} {:<24} count {:<6} size {:<8} offset {:<10} @{:#x}",
                block.code,
                block.type_name,
                block.count,
                block.size,
                block.offset,
                block.memory_address
            )?;
        }
        Ok(())
    }
}
