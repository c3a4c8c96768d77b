//! MAT Level 5 encoder.

use std::io::Write as _;

use chrono::Local;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use octmat_buffers::Writer;
use tracing::{debug, warn};

use super::constants::*;
use super::{mat_dims, Mat5Error, Mat5Options};
use crate::array::{transpose_order, ArrayData, DTypeKind, NdArray};
use crate::mat_value::{CellArray, MatObject, MatValue};

/// Encodes named [`MatValue`]s into a complete MAT Level 5 file image.
pub struct Mat5Encoder {
    pub writer: Writer,
    options: Mat5Options,
}

impl Default for Mat5Encoder {
    fn default() -> Self {
        Self::new(Mat5Options::default())
    }
}

fn byte_count(n: usize) -> Result<u32, Mat5Error> {
    u32::try_from(n).map_err(|_| Mat5Error::ElementTooLarge(n))
}

fn padding(n: usize) -> usize {
    (8 - n % 8) % 8
}

/// Field names are written unless empty or starting with `_` or a digit.
fn is_field_name(name: &str) -> bool {
    matches!(name.chars().next(), Some(c) if c != '_' && !c.is_ascii_digit())
}

/// Text of the descriptive header field, before padding.
pub fn header_text() -> String {
    let platform = if cfg!(windows) { "nt" } else { "posix" };
    format!(
        "MATLAB 5.0 MAT-file Platform: {platform}, Created on: {}",
        Local::now().format("%a %b %e %H:%M:%S %Y")
    )
}

impl Mat5Encoder {
    pub fn new(options: Mat5Options) -> Self {
        Self {
            writer: Writer::new(),
            options,
        }
    }

    pub fn options(&self) -> &Mat5Options {
        &self.options
    }

    /// Encodes `vars` as a MAT file: header, then one element per variable
    /// in order.
    ///
    /// Names starting with `_` are skipped with a warning; an empty name is
    /// an error.
    pub fn encode(&mut self, vars: &[(String, MatValue)]) -> Result<Vec<u8>, Mat5Error> {
        self.writer.reset();
        let result = self.write_vars(vars);
        let bytes = self.writer.flush();
        result.map(|()| bytes)
    }

    fn write_vars(&mut self, vars: &[(String, MatValue)]) -> Result<(), Mat5Error> {
        self.write_header();
        for (name, value) in vars {
            if name.is_empty() {
                return Err(Mat5Error::InvalidName(name.clone()));
            }
            if name.starts_with('_') {
                warn!(name = %name, "skipping variable whose name starts with an underscore");
                continue;
            }
            debug!(name = %name, compress = self.options.compress, "encoding variable");
            if self.options.compress {
                self.write_compressed(name.as_bytes(), value)?;
            } else {
                self.write_matrix(name.as_bytes(), value)?;
            }
        }
        Ok(())
    }

    pub fn write_header(&mut self) {
        let mut text = header_text().into_bytes();
        text.truncate(HEADER_TEXT_LEN);
        text.resize(HEADER_TEXT_LEN, b' ');
        self.writer.buf(&text);
        // subsystem data offset
        self.writer.zeros(HEADER_LEN - HEADER_TEXT_LEN - 4);
        self.writer.u16(VERSION);
        self.writer.buf(ENDIAN_INDICATOR);
    }

    fn write_compressed(&mut self, name: &[u8], value: &MatValue) -> Result<(), Mat5Error> {
        let start = self.writer.len();
        self.write_matrix(name, value)?;
        let raw = self.writer.split_off(start);
        let mut zlib = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
        zlib.write_all(&raw).map_err(Mat5Error::Compress)?;
        let packed = zlib.finish().map_err(Mat5Error::Compress)?;
        // compressed elements are not padded
        self.writer.u32u32(MiType::Compressed as u32, byte_count(packed.len())?);
        self.writer.buf(&packed);
        Ok(())
    }

    /// Writes one `miMATRIX` element, back-patching its byte count.
    pub fn write_matrix(&mut self, name: &[u8], value: &MatValue) -> Result<(), Mat5Error> {
        self.writer.u32(MiType::Matrix as u32);
        let size_pos = self.writer.reserve_u32();
        let start = self.writer.len();
        match value {
            MatValue::Array(array) => self.write_numeric(name, array)?,
            MatValue::Char(text) => self.write_char(name, text)?,
            MatValue::Cell(cell) => self.write_cell(name, cell)?,
            MatValue::Struct(fields) => self.write_struct(name, fields)?,
            MatValue::Object(object) => self.write_object(name, object)?,
        }
        let size = byte_count(self.writer.len() - start)?;
        self.writer.patch_u32(size_pos, size);
        Ok(())
    }

    /// Writes a data element, using the small format for up to four bytes.
    fn write_element<F>(&mut self, ty: MiType, nbytes: usize, body: F) -> Result<(), Mat5Error>
    where
        F: FnOnce(&mut Writer),
    {
        if nbytes <= SMALL_ELEMENT_MAX {
            self.writer.u16(ty as u16);
            self.writer.u16(nbytes as u16);
            body(&mut self.writer);
            self.writer.zeros(SMALL_ELEMENT_MAX - nbytes);
        } else {
            self.writer.u32u32(ty as u32, byte_count(nbytes)?);
            body(&mut self.writer);
            self.writer.zeros(padding(nbytes));
        }
        Ok(())
    }

    /// Writes one value per index of `order`.
    fn write_data<F>(&mut self, ty: MiType, order: &[usize], mut put: F) -> Result<(), Mat5Error>
    where
        F: FnMut(&mut Writer, usize),
    {
        self.write_element(ty, order.len() * ty.width(), |w| {
            for &i in order {
                put(w, i);
            }
        })
    }

    fn write_array_header(
        &mut self,
        name: &[u8],
        class: MxClass,
        flags: u32,
        dims: &[usize],
    ) -> Result<(), Mat5Error> {
        self.writer.u32u32(MiType::UInt32 as u32, 8);
        self.writer.u32u32(class as u32 | flags, 0);
        let dims = dims
            .iter()
            .map(|&d| i32::try_from(d).map_err(|_| Mat5Error::DimensionTooLarge(d)))
            .collect::<Result<Vec<_>, _>>()?;
        self.write_element(MiType::Int32, dims.len() * 4, |w| {
            for d in dims {
                w.i32(d);
            }
        })?;
        self.write_element(MiType::Int8, name.len(), |w| w.buf(name))
    }

    fn write_numeric(&mut self, name: &[u8], array: &NdArray) -> Result<(), Mat5Error> {
        let dtype = *array.dtype();
        let unsupported = || Mat5Error::UnsupportedArray(dtype);
        let (class, ty, flags) = match (dtype.kind(), dtype.itemsize()) {
            (DTypeKind::Bool, _) => (MxClass::UInt8, MiType::UInt8, FLAG_LOGICAL),
            (DTypeKind::Int, 1) => (MxClass::Int8, MiType::Int8, 0),
            (DTypeKind::Int, 2) => (MxClass::Int16, MiType::Int16, 0),
            (DTypeKind::Int, 4) => (MxClass::Int32, MiType::Int32, 0),
            (DTypeKind::Int, 8) => (MxClass::Int64, MiType::Int64, 0),
            (DTypeKind::UInt, 1) => (MxClass::UInt8, MiType::UInt8, 0),
            (DTypeKind::UInt, 2) => (MxClass::UInt16, MiType::UInt16, 0),
            (DTypeKind::UInt, 4) => (MxClass::UInt32, MiType::UInt32, 0),
            (DTypeKind::UInt, 8) => (MxClass::UInt64, MiType::UInt64, 0),
            (DTypeKind::Float, 4) => (MxClass::Single, MiType::Single, 0),
            (DTypeKind::Float, 8) => (MxClass::Double, MiType::Double, 0),
            (DTypeKind::Complex, 8) => (MxClass::Single, MiType::Single, FLAG_COMPLEX),
            (DTypeKind::Complex, 16) => (MxClass::Double, MiType::Double, FLAG_COMPLEX),
            _ => return Err(unsupported()),
        };

        let dims = mat_dims(array.shape(), self.options.oned_as);
        self.write_array_header(name, class, flags, &dims)?;
        let order = transpose_order(array.shape());
        match array.data() {
            ArrayData::Bool(v) => self.write_data(ty, &order, |w, i| w.u8(u8::from(v[i]))),
            ArrayData::Int(v) => self.write_data(ty, &order, |w, i| match ty {
                MiType::Int8 => w.i8(v[i] as i8),
                MiType::Int16 => w.i16(v[i] as i16),
                MiType::Int32 => w.i32(v[i] as i32),
                _ => w.i64(v[i]),
            }),
            ArrayData::UInt(v) => self.write_data(ty, &order, |w, i| match ty {
                MiType::UInt8 => w.u8(v[i] as u8),
                MiType::UInt16 => w.u16(v[i] as u16),
                MiType::UInt32 => w.u32(v[i] as u32),
                _ => w.u64(v[i]),
            }),
            ArrayData::Float(v) => self.write_data(ty, &order, |w, i| put_float(w, ty, v[i])),
            ArrayData::Complex(v) => {
                self.write_data(ty, &order, |w, i| put_float(w, ty, v[i].re))?;
                self.write_data(ty, &order, |w, i| put_float(w, ty, v[i].im))
            }
            _ => Err(unsupported()),
        }
    }

    fn write_char(&mut self, name: &[u8], text: &str) -> Result<(), Mat5Error> {
        let units: Vec<u16> = text.encode_utf16().collect();
        let dims = if units.is_empty() {
            [0, 0]
        } else {
            [1, units.len()]
        };
        self.write_array_header(name, MxClass::Char, 0, &dims)?;
        self.write_element(MiType::UInt16, units.len() * 2, |w| {
            for u in units {
                w.u16(u);
            }
        })
    }

    fn write_cell(&mut self, name: &[u8], cell: &CellArray) -> Result<(), Mat5Error> {
        let dims = mat_dims(cell.shape(), self.options.oned_as);
        self.write_array_header(name, MxClass::Cell, 0, &dims)?;
        for i in transpose_order(cell.shape()) {
            self.write_matrix(b"", &cell.cells()[i])?;
        }
        Ok(())
    }

    fn write_struct(&mut self, name: &[u8], fields: &[(String, MatValue)]) -> Result<(), Mat5Error> {
        let kept: Vec<&(String, MatValue)> = fields
            .iter()
            .filter(|(field, _)| keep_field(field))
            .collect();
        self.write_array_header(name, MxClass::Struct, 0, &[1, 1])?;
        let names: Vec<&str> = kept.iter().map(|(field, _)| field.as_str()).collect();
        self.write_field_names(&names)?;
        for (_, value) in kept {
            self.write_matrix(b"", value)?;
        }
        Ok(())
    }

    fn write_object(&mut self, name: &[u8], object: &MatObject) -> Result<(), Mat5Error> {
        let count: usize = object.shape.iter().product();
        if object.elements.len() != count {
            return Err(Mat5Error::ObjectShape {
                shape: object.shape.clone(),
                actual: object.elements.len(),
            });
        }
        if let Some(row) = object.elements.iter().find(|row| row.len() != object.fields.len()) {
            return Err(Mat5Error::RecordWidth {
                expected: object.fields.len(),
                actual: row.len(),
            });
        }

        let dims = mat_dims(&object.shape, self.options.oned_as);
        self.write_array_header(name, MxClass::Object, 0, &dims)?;
        let class_name = object.class_name.as_bytes();
        self.write_element(MiType::Int8, class_name.len(), |w| w.buf(class_name))?;
        let kept: Vec<usize> = (0..object.fields.len())
            .filter(|&f| keep_field(&object.fields[f]))
            .collect();
        let names: Vec<&str> = kept.iter().map(|&f| object.fields[f].as_str()).collect();
        self.write_field_names(&names)?;
        for i in transpose_order(&object.shape) {
            for &f in &kept {
                self.write_matrix(b"", &object.elements[i][f])?;
            }
        }
        Ok(())
    }

    /// Field name length element followed by the NUL-padded names.
    fn write_field_names(&mut self, names: &[&str]) -> Result<(), Mat5Error> {
        let max = if self.options.long_field_names {
            LONG_FIELD_NAME_MAX
        } else {
            FIELD_NAME_MAX
        };
        if let Some(name) = names.iter().find(|name| name.len() > max) {
            return Err(Mat5Error::FieldNameTooLong {
                name: name.to_string(),
                max,
            });
        }
        let slot = names.iter().map(|name| name.len()).max().unwrap_or(0) + 1;
        self.write_element(MiType::Int32, 4, |w| w.i32(slot as i32))?;
        self.write_element(MiType::Int8, slot * names.len(), |w| {
            for name in names {
                w.ascii(name);
                w.zeros(slot - name.len());
            }
        })
    }
}

fn keep_field(field: &str) -> bool {
    let ok = is_field_name(field);
    if !ok {
        warn!(field = %field, "skipping field that starts with an underscore or a digit");
    }
    ok
}

fn put_float(w: &mut Writer, ty: MiType, value: f64) {
    if ty == MiType::Single {
        w.f32(value as f32);
    } else {
        w.f64(value);
    }
}
