//! Minimal MAT Level 5 reader used to check written files.

use std::io::Read;

use flate2::read::ZlibDecoder;
use octmat_buffers::{BufferError, Reader};

const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_INT64: u32 = 12;
const MI_UINT64: u32 = 13;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

pub const CLASS_CELL: u32 = 1;
pub const CLASS_STRUCT: u32 = 2;
pub const CLASS_OBJECT: u32 = 3;
pub const CLASS_CHAR: u32 = 4;
pub const CLASS_DOUBLE: u32 = 6;
pub const CLASS_INT8: u32 = 8;
pub const CLASS_UINT8: u32 = 9;
pub const CLASS_INT64: u32 = 14;
pub const CLASS_UINT64: u32 = 15;

pub const FLAG_COMPLEX: u32 = 0x0800;
pub const FLAG_LOGICAL: u32 = 0x0200;

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Numeric {
        class: u32,
        flags: u32,
        dims: Vec<usize>,
        real: Vec<f64>,
        imag: Option<Vec<f64>>,
    },
    Char {
        dims: Vec<usize>,
        text: String,
    },
    Cell {
        dims: Vec<usize>,
        cells: Vec<Decoded>,
    },
    Struct {
        fields: Vec<(String, Decoded)>,
    },
    Object {
        class_name: String,
        dims: Vec<usize>,
        fields: Vec<String>,
        elements: Vec<Vec<Decoded>>,
    },
}

impl Decoded {
    pub fn dims(&self) -> &[usize] {
        match self {
            Decoded::Numeric { dims, .. }
            | Decoded::Char { dims, .. }
            | Decoded::Cell { dims, .. }
            | Decoded::Object { dims, .. } => dims,
            Decoded::Struct { .. } => &[1, 1],
        }
    }

    pub fn real(&self) -> &[f64] {
        match self {
            Decoded::Numeric { real, .. } => real,
            other => panic!("expected numeric, got {other:?}"),
        }
    }

    pub fn scalar(&self) -> f64 {
        let real = self.real();
        assert_eq!(real.len(), 1, "expected a scalar");
        real[0]
    }

    pub fn class(&self) -> u32 {
        match self {
            Decoded::Numeric { class, .. } => *class,
            Decoded::Char { .. } => CLASS_CHAR,
            Decoded::Cell { .. } => CLASS_CELL,
            Decoded::Struct { .. } => CLASS_STRUCT,
            Decoded::Object { .. } => CLASS_OBJECT,
        }
    }

    pub fn cells(&self) -> &[Decoded] {
        match self {
            Decoded::Cell { cells, .. } => cells,
            other => panic!("expected cell, got {other:?}"),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Decoded::Char { text, .. } => text,
            other => panic!("expected char, got {other:?}"),
        }
    }

    pub fn field(&self, name: &str) -> &Decoded {
        match self {
            Decoded::Struct { fields } => fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v)
                .unwrap_or_else(|| panic!("no field {name}")),
            other => panic!("expected struct, got {other:?}"),
        }
    }
}

#[derive(Debug)]
pub struct MatFile {
    pub header_text: String,
    pub vars: Vec<(String, Decoded)>,
    /// Element type of each top-level element, in order.
    pub element_types: Vec<u32>,
}

impl MatFile {
    pub fn var(&self, name: &str) -> &Decoded {
        self.vars
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .unwrap_or_else(|| panic!("no variable {name}"))
    }

    pub fn names(&self) -> Vec<&str> {
        self.vars.iter().map(|(k, _)| k.as_str()).collect()
    }
}

fn buffer_err(e: BufferError) -> String {
    e.to_string()
}

pub fn read_mat(bytes: &[u8]) -> Result<MatFile, String> {
    let mut r = Reader::new(bytes);
    let text = r.buf(116).map_err(buffer_err)?;
    r.skip(8).map_err(buffer_err)?;
    let version = r.u16().map_err(buffer_err)?;
    let endian = r.buf(2).map_err(buffer_err)?;
    if version != 0x0100 || endian != b"IM" {
        return Err(format!("bad header: version {version:#x}, endian {endian:?}"));
    }

    let mut vars = Vec::new();
    let mut element_types = Vec::new();
    while r.size() > 0 {
        let ty = r.u32().map_err(buffer_err)?;
        let len = r.u32().map_err(buffer_err)? as usize;
        let data = r.buf(len).map_err(buffer_err)?;
        element_types.push(ty);
        match ty {
            MI_MATRIX => vars.push(read_matrix(data)?),
            MI_COMPRESSED => {
                let mut inflated = Vec::new();
                ZlibDecoder::new(data)
                    .read_to_end(&mut inflated)
                    .map_err(|e| e.to_string())?;
                let mut inner = Reader::new(&inflated);
                let (inner_ty, body) = read_element(&mut inner)?;
                if inner_ty != MI_MATRIX {
                    return Err(format!("compressed element holds type {inner_ty}"));
                }
                vars.push(read_matrix(body)?);
            }
            other => return Err(format!("unexpected top-level element {other}")),
        }
    }
    Ok(MatFile {
        header_text: String::from_utf8_lossy(text).trim_end().to_string(),
        vars,
        element_types,
    })
}

/// Reads one data element, small or regular, and skips its padding.
fn read_element<'a>(r: &mut Reader<'a>) -> Result<(u32, &'a [u8]), String> {
    let first = r.u32().map_err(buffer_err)?;
    if first >> 16 != 0 {
        let len = (first >> 16) as usize;
        let data = r.buf(4).map_err(buffer_err)?;
        return Ok((first & 0xffff, &data[..len]));
    }
    let len = r.u32().map_err(buffer_err)? as usize;
    let data = r.buf(len).map_err(buffer_err)?;
    r.align(8).map_err(buffer_err)?;
    Ok((first, data))
}

fn values(ty: u32, data: &[u8]) -> Result<Vec<f64>, String> {
    let mut r = Reader::new(data);
    let mut out = Vec::new();
    while r.size() > 0 {
        let v = match ty {
            MI_INT8 => r.i8().map(f64::from),
            MI_UINT8 => r.u8().map(f64::from),
            MI_INT16 => r.i16().map(f64::from),
            MI_UINT16 => r.u16().map(f64::from),
            MI_INT32 => r.i32().map(f64::from),
            MI_UINT32 => r.u32().map(f64::from),
            MI_SINGLE => r.f32().map(f64::from),
            MI_DOUBLE => r.f64(),
            MI_INT64 => r.i64().map(|v| v as f64),
            MI_UINT64 => r.u64().map(|v| v as f64),
            other => return Err(format!("unexpected data type {other}")),
        };
        out.push(v.map_err(buffer_err)?);
    }
    Ok(out)
}

fn int32s(data: &[u8]) -> Result<Vec<i32>, String> {
    let mut r = Reader::new(data);
    let mut out = Vec::new();
    while r.size() > 0 {
        out.push(r.i32().map_err(buffer_err)?);
    }
    Ok(out)
}

fn read_field_names(r: &mut Reader<'_>) -> Result<Vec<String>, String> {
    let (_, slot) = read_element(r)?;
    let slot = int32s(slot)?[0] as usize;
    let (_, names) = read_element(r)?;
    Ok(names
        .chunks(slot)
        .map(|chunk| {
            let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
            String::from_utf8_lossy(&chunk[..end]).to_string()
        })
        .collect())
}

fn read_nested(r: &mut Reader<'_>) -> Result<Decoded, String> {
    let (ty, body) = read_element(r)?;
    if ty != MI_MATRIX {
        return Err(format!("expected nested matrix, got type {ty}"));
    }
    let (name, value) = read_matrix(body)?;
    if !name.is_empty() {
        return Err(format!("nested matrix is named {name:?}"));
    }
    Ok(value)
}

pub fn read_matrix(body: &[u8]) -> Result<(String, Decoded), String> {
    let mut r = Reader::new(body);
    let (_, flags) = read_element(&mut r)?;
    let flags_class = Reader::new(flags).u32().map_err(buffer_err)?;
    let class = flags_class & 0xff;
    let flags = flags_class & 0xff00;
    let (_, dims) = read_element(&mut r)?;
    let dims: Vec<usize> = int32s(dims)?.into_iter().map(|d| d as usize).collect();
    let (_, name) = read_element(&mut r)?;
    let name = Reader::new(name).utf8(name.len()).map_err(buffer_err)?.to_string();
    let count: usize = dims.iter().product();

    let value = match class {
        CLASS_CELL => {
            let cells = (0..count)
                .map(|_| read_nested(&mut r))
                .collect::<Result<Vec<_>, _>>()?;
            Decoded::Cell { dims, cells }
        }
        CLASS_STRUCT => {
            let names = read_field_names(&mut r)?;
            let mut fields = Vec::new();
            for field in names {
                fields.push((field, read_nested(&mut r)?));
            }
            Decoded::Struct { fields }
        }
        CLASS_OBJECT => {
            let (_, class_name) = read_element(&mut r)?;
            let class_name = String::from_utf8_lossy(class_name).to_string();
            let fields = read_field_names(&mut r)?;
            let mut elements = Vec::new();
            for _ in 0..count {
                let row = fields
                    .iter()
                    .map(|_| read_nested(&mut r))
                    .collect::<Result<Vec<_>, _>>()?;
                elements.push(row);
            }
            Decoded::Object {
                class_name,
                dims,
                fields,
                elements,
            }
        }
        CLASS_CHAR => {
            let (_, data) = read_element(&mut r)?;
            let units: Vec<u16> = values(MI_UINT16, data)?.into_iter().map(|u| u as u16).collect();
            let text = String::from_utf16(&units).map_err(|e| e.to_string())?;
            Decoded::Char { dims, text }
        }
        _ => {
            let (ty, data) = read_element(&mut r)?;
            let real = values(ty, data)?;
            let imag = if flags & FLAG_COMPLEX != 0 {
                let (ty, data) = read_element(&mut r)?;
                Some(values(ty, data)?)
            } else {
                None
            };
            Decoded::Numeric {
                class,
                flags,
                dims,
                real,
                imag,
            }
        }
    };
    if r.size() != 0 {
        return Err(format!("{} trailing bytes in matrix {name:?}", r.size()));
    }
    Ok((name, value))
}
