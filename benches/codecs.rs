use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use eca::{codec_for, Algorithm, ControlToken, FrequencyTable};

fn sample_data() -> Vec<u8> {
	let sentence = b"the quick brown fox jumps over the lazy dog. ";
	sentence.iter().copied().cycle().take(4 * 1024 * 1024).collect()
}

fn bench_encode(c: &mut Criterion) {
	let data = sample_data();
	let frequencies = FrequencyTable::from_bytes(&data);
	let ctrl = ControlToken::new();
	let mut group = c.benchmark_group("encode");
	group.throughput(Throughput::Bytes(data.len() as u64));
	for algorithm in [Algorithm::Huffman, Algorithm::ShannonFano] {
		let codec = codec_for(algorithm);
		group.bench_function(algorithm.as_str(), |b| {
			b.iter(|| codec.encode(&data, &frequencies, &ctrl).unwrap());
		});
	}
	group.finish();
}

fn bench_decode(c: &mut Criterion) {
	let data = sample_data();
	let frequencies = FrequencyTable::from_bytes(&data);
	let ctrl = ControlToken::new();
	let mut group = c.benchmark_group("decode");
	group.throughput(Throughput::Bytes(data.len() as u64));
	for algorithm in [Algorithm::Huffman, Algorithm::ShannonFano] {
		let codec = codec_for(algorithm);
		let payload = codec.encode(&data, &frequencies, &ctrl).unwrap();
		group.bench_function(algorithm.as_str(), |b| {
			b.iter(|| codec.decode(&payload, &frequencies, &ctrl).unwrap());
		});
	}
	group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
