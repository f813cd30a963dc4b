//! Binary name-keyed tuple codec.
//!
//! Layout: magic byte, format version, schema name, pair count, then
//! `(key, tagged value)` pairs in grain iteration order. All integers are
//! little-endian; names and keys carry a u16 length prefix, string values
//! a u32 prefix. Nested grains embed recursively as name + pairs and
//! resolve their factory through the process registry on decode.
//!
//! Decode dispatches every pair by key name, so encodings survive basis
//! declaration-order changes between schema versions as long as the
//! property names are stable.

use grain_core::codec::{wire_entries, EncodeStyle, GrainAssembler, GrainCodec};
use grain_core::collect::ConstList;
use grain_core::grain::{factory_for, Grain, GrainFactory};
use grain_core::transform::TransformFactory;
use grain_core::value::Value;

use crate::error::CodecError;

const MAGIC: u8 = 0x47;
const VERSION: u8 = 1;

mod tag {
    pub const NULL: u8 = 0;
    pub const FALSE: u8 = 1;
    pub const TRUE: u8 = 2;
    pub const INT: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const DECIMAL: u8 = 5;
    pub const STR: u8 = 6;
    pub const LIST: u8 = 7;
    pub const MAP: u8 = 8;
    pub const GRAIN: u8 = 9;
}

/// The binary tuple adapter.
#[derive(Debug, Clone, Default)]
pub struct TupleCodec {
    transforms: TransformFactory,
}

impl TupleCodec {
    pub fn new() -> TupleCodec {
        TupleCodec::default()
    }

    pub fn with_transforms(transforms: TransformFactory) -> TupleCodec {
        TupleCodec { transforms }
    }

    pub fn to_bytes(&self, grain: &Grain, style: EncodeStyle) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.push(MAGIC);
        buf.push(VERSION);
        write_grain(&mut buf, grain, style);
        buf
    }

    pub fn from_bytes(&self, factory: &dyn GrainFactory, wire: &[u8]) -> Result<Grain, CodecError> {
        let mut r = Reader::new(wire);
        let magic = r.u8()?;
        if magic != MAGIC {
            return Err(CodecError::malformed(format!("bad magic byte {magic:#04x}")));
        }
        let version = r.u8()?;
        if version != VERSION {
            return Err(CodecError::malformed(format!(
                "unsupported format version {version}"
            )));
        }
        let name = r.str16()?;
        if name != factory.schema().name() {
            return Err(CodecError::SchemaMismatch {
                wire: name.to_owned(),
                factory: factory.schema().name().to_owned(),
            });
        }
        let grain = self.read_grain_body(&mut r, factory)?;
        if r.remaining() > 0 {
            return Err(CodecError::malformed(format!(
                "{} trailing bytes after value",
                r.remaining()
            )));
        }
        Ok(grain)
    }

    fn read_grain_body(
        &self,
        r: &mut Reader<'_>,
        factory: &dyn GrainFactory,
    ) -> Result<Grain, CodecError> {
        let mut assembler = GrainAssembler::with_transforms(factory, &self.transforms);
        let count = r.u32()?;
        for _ in 0..count {
            let key = r.str16()?.to_owned();
            let value = self.read_value(r)?;
            assembler
                .put(&key, value)
                .map_err(|source| CodecError::Cast { key, source })?;
        }
        Ok(assembler.finish())
    }

    fn read_value(&self, r: &mut Reader<'_>) -> Result<Value, CodecError> {
        let at = r.position();
        match r.u8()? {
            tag::NULL => Ok(Value::Null),
            tag::FALSE => Ok(Value::Bool(false)),
            tag::TRUE => Ok(Value::Bool(true)),
            tag::INT => Ok(Value::Int(r.i64()?)),
            tag::FLOAT => Ok(Value::Float(r.f64()?)),
            tag::DECIMAL => {
                let at = r.position();
                let text = r.str16()?;
                text.parse().map(Value::Decimal).map_err(|_| {
                    CodecError::malformed(format!("invalid decimal {text:?} at byte {at}"))
                })
            }
            tag::STR => Ok(Value::Str(r.str32()?.to_owned())),
            tag::LIST => {
                let count = r.u32()?;
                // cap the pre-size; a hostile count still fails at the
                // first missing byte
                let mut items = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    items.push(self.read_value(r)?);
                }
                Ok(Value::List(ConstList::from(items)))
            }
            tag::MAP => {
                let count = r.u32()?;
                let mut entries = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    let key = r.str16()?.to_owned();
                    entries.push((key, self.read_value(r)?));
                }
                Ok(Value::Map(entries.into_iter().collect()))
            }
            tag::GRAIN => {
                let name = r.str16()?;
                let factory = factory_for(name).ok_or_else(|| CodecError::UnknownSchema {
                    schema: name.to_owned(),
                })?;
                self.read_grain_body(r, factory.as_ref()).map(Value::Grain)
            }
            other => Err(CodecError::UnknownTag { tag: other, at }),
        }
    }
}

impl GrainCodec for TupleCodec {
    type Wire = Vec<u8>;
    type Error = CodecError;

    fn encode(&self, grain: &Grain, style: EncodeStyle) -> Vec<u8> {
        self.to_bytes(grain, style)
    }

    fn decode(&self, factory: &dyn GrainFactory, wire: &Vec<u8>) -> Result<Grain, CodecError> {
        self.from_bytes(factory, wire)
    }
}

// ── Writing ──────────────────────────────────────────────────────────

fn write_grain(buf: &mut Vec<u8>, grain: &Grain, style: EncodeStyle) {
    write_str16(buf, grain.schema().name());
    let entries: Vec<(&str, &Value)> = wire_entries(grain, style).collect();
    write_u32(buf, entries.len() as u32);
    for (key, value) in entries {
        write_str16(buf, key);
        write_value(buf, value, style);
    }
}

fn write_value(buf: &mut Vec<u8>, value: &Value, style: EncodeStyle) {
    match value {
        Value::Null => buf.push(tag::NULL),
        Value::Bool(false) => buf.push(tag::FALSE),
        Value::Bool(true) => buf.push(tag::TRUE),
        Value::Int(i) => {
            buf.push(tag::INT);
            buf.extend_from_slice(&i.to_le_bytes());
        }
        Value::Float(f) => {
            buf.push(tag::FLOAT);
            buf.extend_from_slice(&f.to_le_bytes());
        }
        Value::Decimal(d) => {
            buf.push(tag::DECIMAL);
            write_str16(buf, &d.to_string());
        }
        Value::Str(s) => {
            buf.push(tag::STR);
            write_str32(buf, s);
        }
        Value::List(items) => {
            buf.push(tag::LIST);
            write_u32(buf, items.len() as u32);
            for item in items.iter() {
                write_value(buf, item, style);
            }
        }
        Value::Map(entries) => {
            buf.push(tag::MAP);
            write_u32(buf, entries.len() as u32);
            for (key, value) in entries.iter() {
                write_str16(buf, key);
                write_value(buf, value, style);
            }
        }
        Value::Grain(g) => {
            buf.push(tag::GRAIN);
            write_grain(buf, g, style);
        }
    }
}

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_str16(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u16).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn write_str32(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

// ── Reading ──────────────────────────────────────────────────────────

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated { at: self.pos });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        // SAFETY: take returns exactly the requested byte count
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        // SAFETY: take returns exactly the requested byte count
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn i64(&mut self) -> Result<i64, CodecError> {
        // SAFETY: take returns exactly the requested byte count
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn f64(&mut self) -> Result<f64, CodecError> {
        // SAFETY: take returns exactly the requested byte count
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn str16(&mut self) -> Result<&'a str, CodecError> {
        let len = self.u16()? as usize;
        self.str_bytes(len)
    }

    fn str32(&mut self) -> Result<&'a str, CodecError> {
        let len = self.u32()? as usize;
        self.str_bytes(len)
    }

    fn str_bytes(&mut self, len: usize) -> Result<&'a str, CodecError> {
        let at = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map_err(|_| CodecError::malformed(format!("invalid utf-8 at byte {at}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grain_core::grain::{register_factory, BasicGrainFactory, GrainProperty, GrainSchema};
    use grain_core::reflect::{names, Type};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn reading_factory() -> Arc<dyn GrainFactory> {
        let schema = GrainSchema::new(
            "TupleReading",
            "TupleReadingGrain",
            vec![
                GrainProperty::new("celsius", Type::named(names::FLOAT64)),
                GrainProperty::new("exact", Type::named(names::DECIMAL)),
                GrainProperty::new("station", Type::named(names::STRING)),
            ],
            vec![Value::Float(0.0), Value::Decimal(Decimal::ZERO), Value::Null],
        )
        .unwrap();
        Arc::new(BasicGrainFactory::new(Arc::new(schema)))
    }

    #[test]
    fn scalars_round_trip_bit_exact() {
        let codec = TupleCodec::new();
        let factory = reading_factory();
        let grain = factory
            .default_grain()
            .with("celsius", f64::NAN)
            .with("exact", Value::Decimal("12.50".parse().unwrap()))
            .with("station", "K7")
            .with("flagged", true);

        let wire = codec.to_bytes(&grain, EncodeStyle::Dense);
        let decoded = codec.from_bytes(factory.as_ref(), &wire).unwrap();
        assert_eq!(decoded, grain);
    }

    #[test]
    fn sparse_drops_defaults_and_restores_them() {
        let codec = TupleCodec::new();
        let factory = reading_factory();
        let grain = factory.default_grain().with("station", "K7");

        let wire = codec.to_bytes(&grain, EncodeStyle::Sparse);
        let decoded = codec.from_bytes(factory.as_ref(), &wire).unwrap();
        assert_eq!(decoded, grain);

        let empty = codec.to_bytes(&factory.default_grain(), EncodeStyle::Sparse);
        let restored = codec.from_bytes(factory.as_ref(), &empty).unwrap();
        assert_eq!(restored, factory.default_grain());
    }

    #[test]
    fn pairs_decode_by_name_not_position() {
        let codec = TupleCodec::new();
        let factory = reading_factory();

        // hand-built stream with pairs in reverse declaration order
        let mut wire = vec![MAGIC, VERSION];
        write_str16(&mut wire, "TupleReading");
        write_u32(&mut wire, 2);
        write_str16(&mut wire, "station");
        write_value(&mut wire, &Value::Str("K7".into()), EncodeStyle::Dense);
        write_str16(&mut wire, "celsius");
        write_value(&mut wire, &Value::Float(21.5), EncodeStyle::Dense);

        let decoded = codec.from_bytes(factory.as_ref(), &wire).unwrap();
        assert_eq!(decoded.get("celsius"), Some(&Value::Float(21.5)));
        assert_eq!(decoded.get("station"), Some(&Value::Str("K7".into())));
    }

    #[test]
    fn truncated_input_reports_the_position() {
        let codec = TupleCodec::new();
        let factory = reading_factory();
        let wire = codec.to_bytes(
            &factory.default_grain().with("station", "K7"),
            EncodeStyle::Dense,
        );

        let cut = &wire[..wire.len() - 3];
        let err = codec.from_bytes(factory.as_ref(), cut).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }), "got {err:?}");
    }

    #[test]
    fn unknown_tags_and_bad_headers_are_rejected() {
        let codec = TupleCodec::new();
        let factory = reading_factory();

        let mut wire = vec![MAGIC, VERSION];
        write_str16(&mut wire, "TupleReading");
        write_u32(&mut wire, 1);
        write_str16(&mut wire, "celsius");
        let tag_at = wire.len();
        wire.push(0xEE);
        let err = codec.from_bytes(factory.as_ref(), &wire).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownTag {
                tag: 0xEE,
                at: tag_at
            }
        );

        let err = codec.from_bytes(factory.as_ref(), &[0x00, VERSION]).unwrap_err();
        assert!(err.to_string().contains("bad magic"));

        let mut other = vec![MAGIC, VERSION];
        write_str16(&mut other, "SomethingElse");
        write_u32(&mut other, 0);
        let err = codec.from_bytes(factory.as_ref(), &other).unwrap_err();
        assert_eq!(
            err,
            CodecError::SchemaMismatch {
                wire: "SomethingElse".into(),
                factory: "TupleReading".into()
            }
        );
    }

    #[test]
    fn basis_type_mismatch_carries_the_key() {
        let codec = TupleCodec::new();
        let factory = reading_factory();

        let mut wire = vec![MAGIC, VERSION];
        write_str16(&mut wire, "TupleReading");
        write_u32(&mut wire, 1);
        write_str16(&mut wire, "celsius");
        write_value(&mut wire, &Value::Str("warm".into()), EncodeStyle::Dense);

        let err = codec.from_bytes(factory.as_ref(), &wire).unwrap_err();
        match err {
            CodecError::Cast { key, source } => {
                assert_eq!(key, "celsius");
                assert_eq!(source.to_string(), "expected Float64, got String");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nested_grains_embed_and_resolve_by_schema_name() {
        let inner = GrainSchema::new(
            "TupleInner",
            "TupleInnerGrain",
            vec![GrainProperty::new("n", Type::named(names::INT64))],
            vec![Value::Int(0)],
        )
        .unwrap();
        let inner_factory = register_factory(Arc::new(BasicGrainFactory::new(Arc::new(inner))));

        let outer = GrainSchema::new(
            "TupleOuter",
            "TupleOuterGrain",
            vec![GrainProperty::new("child", Type::named("TupleInnerGrain"))],
            vec![Value::Null],
        )
        .unwrap();
        let outer_factory = BasicGrainFactory::new(Arc::new(outer));

        let codec = TupleCodec::new();
        let child = inner_factory.default_grain().with("n", 41);
        let grain = outer_factory.default_grain().with("child", child.clone());

        let wire = codec.to_bytes(&grain, EncodeStyle::Dense);
        let decoded = codec.from_bytes(&outer_factory, &wire).unwrap();
        assert_eq!(decoded.get("child"), Some(&Value::Grain(child)));
    }
}
