use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flatcsv::column::ColumnTree;
use flatcsv::cursor::RowFormatter;
use flatcsv::schema::{
    ArrayType, DynamicType, EnumType, Member, PrimitiveKind, SequenceType, StructType, UnionCase,
    UnionType,
};
use flatcsv::traverse::{collect_events, traverse};
use flatcsv::{sample, CsvOptions, CsvStreamWriter, MemberMap, OwnedEvent, Value};

fn track_type(bound: u32) -> DynamicType {
    let point = StructType::new("Point")
        .member(Member::new("x", PrimitiveKind::Float64))
        .member(Member::new("y", PrimitiveKind::Float64))
        .member(Member::optional("z", PrimitiveKind::Float64));
    let status = EnumType::new("Status")
        .enumerator("IDLE", 0)
        .enumerator("MOVING", 1);
    let payload = UnionType::new("Payload", PrimitiveKind::Int32)
        .case(UnionCase::new("count", PrimitiveKind::UInt32, &[1]))
        .case(UnionCase::new("label", DynamicType::string(), &[2]));

    StructType::new("Track")
        .member(Member::new("id", PrimitiveKind::UInt64))
        .member(Member::new("status", status))
        .member(Member::new("payload", payload))
        .member(Member::new("matrix", ArrayType::new(PrimitiveKind::Int16, &[3, 3])))
        .member(Member::new("points", SequenceType::new(point, bound)))
        .into()
}

fn track_sample(points: usize) -> Value {
    let points: Vec<Value> = (0..points)
        .map(|i| {
            let mut point = MemberMap::new();
            point.insert("x", Value::from(i as f64));
            point.insert("y", Value::from(i as f64 * 0.5));
            Value::Struct(point)
        })
        .collect();

    let mut members = MemberMap::new();
    members.insert("id", Value::from(7u64));
    members.insert("status", Value::Enum(1));
    members.insert("payload", sample!(union 2 => "north"));
    members.insert("matrix", Value::from(vec![1i16; 9]));
    members.insert("points", Value::Sequence(points));
    Value::Struct(members)
}

fn benchmark_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_layout");

    for bound in [8u32, 64, 512].iter() {
        let ty = track_type(*bound);
        group.bench_with_input(BenchmarkId::from_parameter(bound), &ty, |b, ty| {
            b.iter(|| ColumnTree::compile(black_box(ty)))
        });
    }
    group.finish();
}

fn benchmark_format_events(c: &mut Criterion) {
    let ty = track_type(64);
    let tree = ColumnTree::compile(&ty);
    let options = CsvOptions::default();
    let events: Vec<OwnedEvent> = collect_events(&ty, &track_sample(32), &options).unwrap();

    c.bench_function("format_recorded_events", |b| {
        b.iter(|| {
            RowFormatter::format_events(
                &tree,
                &options,
                black_box(&events).iter().map(OwnedEvent::as_event),
            )
        })
    });
}

fn benchmark_traverse_and_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse_and_format");
    let ty = track_type(512);
    let tree = ColumnTree::compile(&ty);
    let options = CsvOptions::default();

    for points in [0usize, 32, 512].iter() {
        let value = track_sample(*points);
        group.bench_with_input(BenchmarkId::from_parameter(points), &value, |b, value| {
            b.iter(|| {
                let mut formatter = RowFormatter::new(&tree, &options);
                traverse(&ty, black_box(value), &options, |event| formatter.handle(event))
                    .and_then(|()| formatter.finish())
            })
        });
    }
    group.finish();
}

fn benchmark_stream_writer(c: &mut Criterion) {
    let ty = track_type(64);
    let value = track_sample(16);

    c.bench_function("stream_writer_100_rows", |b| {
        b.iter(|| {
            let mut writer =
                CsvStreamWriter::new("Track", ty.clone(), CsvOptions::default(), Vec::new())
                    .unwrap();
            for timestamp in 0..100 {
                writer.write_sample(timestamp, black_box(&value)).unwrap();
            }
            writer.into_inner()
        })
    });
}

criterion_group!(
    benches,
    benchmark_compile,
    benchmark_format_events,
    benchmark_traverse_and_format,
    benchmark_stream_writer
);
criterion_main!(benches);
