//! Records two streams into a merged CSV file.
//!
//! Run with: cargo run --example record [output_dir]

use chrono::Utc;
use flatcsv::schema::{
    DynamicType, EnumType, Member, PrimitiveKind, SequenceType, StructType, UnionCase, UnionType,
};
use flatcsv::storage::{OUTPUT_DIR_PROPERTY_NAME, OUTPUT_FILE_BASENAME_PROPERTY_NAME};
use flatcsv::{sample, Sample, SampleInfo, StorageWriter};
use std::error::Error;
use std::fs;

fn square_type() -> DynamicType {
    let color = EnumType::new("Color")
        .enumerator("RED", 0)
        .enumerator("GREEN", 1)
        .enumerator("BLUE", 2);
    StructType::new("ShapeType")
        .member(Member::new("color", color))
        .member(Member::new("x", PrimitiveKind::Int32))
        .member(Member::new("y", PrimitiveKind::Int32))
        .member(Member::optional("size", PrimitiveKind::Int32))
        .member(Member::new("trail", SequenceType::new(PrimitiveKind::Int16, 4)))
        .into()
}

fn command_type() -> DynamicType {
    UnionType::new("Command", PrimitiveKind::Int32)
        .case(UnionCase::new("stop", PrimitiveKind::Boolean, &[0]))
        .case(UnionCase::new("speed", PrimitiveKind::Float32, &[1]))
        .case(UnionCase::default_case("note", DynamicType::string()))
        .into()
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let dir = std::env::args()
        .nth(1)
        .map_or_else(|| std::env::temp_dir().join("flatcsv-demo"), Into::into);
    fs::create_dir_all(&dir)?;
    let dir_text = dir.to_string_lossy().into_owned();

    let mut storage = StorageWriter::from_properties([
        (OUTPUT_DIR_PROPERTY_NAME, dir_text.as_str()),
        (OUTPUT_FILE_BASENAME_PROPERTY_NAME, "shapes"),
    ])?;

    storage.create_stream_writer("Square", square_type())?;
    storage.create_stream_writer("Command", command_type())?;

    let now = SampleInfo::new(Utc::now());
    storage.store(
        "Square",
        &[
            Sample::new(now, sample!({ "color": (enum 2), "x": 10, "y": 20, "trail": [1, 2] })),
            Sample::new(
                now,
                sample!({ "color": (enum 0), "x": 11, "y": 21, "size": 30, "trail": [] }),
            ),
        ],
    )?;
    storage.store(
        "Command",
        &[
            Sample::new(now, sample!(union 1 => 2.5)),
            Sample::new(now, sample!(union 7 => "turn left")),
        ],
    )?;
    storage.finish()?;

    let merged = dir.join("shapes.csv");
    println!("{}:\n{}", merged.display(), fs::read_to_string(&merged)?);
    Ok(())
}
