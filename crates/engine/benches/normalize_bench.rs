//! 정규화/추출 벤치마크
//!
//! 재작성 파이프라인과 파라미터 추출의 처리량을 측정합니다.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use logsmith_engine::{Normalizer, ParameterExtractor};

/// 마스킹 규칙 대부분을 지나가는 인증 실패 줄
const AUTH_FAILURE: &str = "Jun 15 02:04:59 combo sshd(pam_unix)[20882]: authentication failure; \
    logname= uid=0 euid=0 tty=NODEVssh ruser= rhost=220-135-151-1.hinet-ip.hinet.net user=root";

/// 규칙 매칭이 거의 없는 짧은 줄
const PLAIN_LINE: &str = "Jun 15 02:04:59 combo syslogd 1.4.1: restart.";

/// 추출 벤치마크용 세션 줄과 템플릿
const SESSION_LINE: &str =
    "Jun 15 04:06:18 combo su(pam_unix)[21416]: session opened for user cyrus by (uid=0)";
const SESSION_TEMPLATE: &str =
    "<TIMESTAMP> <HOSTNAME> su(pam_unix)[<PID>]: session <STATE> for user <USERNAME> by (uid=<UID>)";

fn bench_normalizer(c: &mut Criterion) {
    let normalizer = Normalizer::new().unwrap();

    let mut group = c.benchmark_group("normalizer");
    group.throughput(Throughput::Elements(1));

    group.bench_function("auth_failure", |b| {
        b.iter(|| normalizer.normalize(black_box(AUTH_FAILURE)))
    });

    group.bench_function("plain_line", |b| {
        b.iter(|| normalizer.normalize(black_box(PLAIN_LINE)))
    });

    // 1000건 반복 처리량
    group.throughput(Throughput::Elements(1000));
    group.bench_function("throughput_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                normalizer.normalize(black_box(AUTH_FAILURE));
            }
        })
    });

    group.finish();
}

fn bench_extractor(c: &mut Criterion) {
    let mut group = c.benchmark_group("extractor");
    group.throughput(Throughput::Elements(1));

    group.bench_function("session_line", |b| {
        let mut extractor = ParameterExtractor::new().unwrap();
        b.iter(|| extractor.extract(black_box(SESSION_LINE), black_box(SESSION_TEMPLATE)))
    });

    group.finish();
}

criterion_group!(benches, bench_normalizer, bench_extractor);
criterion_main!(benches);
