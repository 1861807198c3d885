mod support;

use analysis::event::{PlayerId, Team};
use analysis::pipeline::{self, partition_rounds, PipelineError, Stage};
use analysis::rating::RatingConfig;
use analysis::source::{JsonLinesSource, Recording, SourceError, TelemetrySource};
use analysis::Settings;
use pretty_assertions::assert_eq;
use support::*;
use tracing_test::traced_test;

fn busy_match() -> MatchBuilder {
    let mut builder = MatchBuilder::new(three_v_three());
    builder
        .round_start(0)
        .visible(5, T1, CT1)
        .shot(10, T1, 2.0)
        .damage(12, T1, CT1, 70)
        .headshot(20, T1, CT1)
        .kill(30, T1, CT2)
        .kill(40, CT3, T2)
        .kill(50, CT3, T3)
        .round_end(400, Team::Terrorist)
        .round_start(500)
        .visible(510, CT2, T3)
        .damage(530, CT2, T3, 100)
        .kill(530, CT2, T3)
        .kill(540, CT2, T2)
        .kill(560, CT2, T1)
        .round_end(600, Team::CounterTerrorist)
        .round_start(700)
        .damage(710, T2, CT1, 40)
        .kill(720, T2, CT1)
        .round_end(900, Team::Terrorist);
    builder
}

#[test]
fn reads_json_lines() {
    let recording = busy_match().build();
    let text = recording.to_json_lines().unwrap();

    let source = JsonLinesSource::new(text.as_bytes()).unwrap();
    assert_eq!(source.header().map, "de_nuke");

    let decoded = Recording::collect(source).unwrap();
    assert_eq!(decoded, recording);
}

#[test]
fn blank_lines_are_skipped() {
    let text = concat!(
        "\n",
        r#"{"header":{"map":"aim_map","players":[{"id":1,"name":"fragger","team":"t"},{"id":11,"name":"feeder","team":"ct"}]}}"#,
        "\n\n",
        r#"{"event":{"tick":1,"round":1,"kind":"round_start"}}"#,
        "\n",
        r#"{"event":{"tick":9,"round":1,"kind":{"kill":{"attacker":1,"victim":11,"headshot":true}}}}"#,
        "\n",
        r#"{"event":{"tick":12,"round":1,"kind":{"round_end":{"winner":"t","reason":9}}}}"#,
        "\n",
        r#""end""#,
        "\n",
    );

    let recording = Recording::collect(JsonLinesSource::new(text.as_bytes()).unwrap()).unwrap();

    assert_eq!(recording.events.len(), 3);
    let stats = pipeline::aggregate(recording.source(), &Settings::default()).unwrap();
    assert_eq!(stats.metrics[&T1].headshot_kills, 1);
}

#[test]
fn missing_end_marker_fails_ingestion() {
    let recording = busy_match().build();
    let text = recording.to_json_lines().unwrap();
    let truncated = text.trim_end().rsplit_once('\n').unwrap().0;

    let source = JsonLinesSource::new(truncated.as_bytes()).unwrap();
    let err = pipeline::analyse(source, &Settings::default(), &RatingConfig::default()).unwrap_err();

    assert!(matches!(err, PipelineError::Source(SourceError::Truncated)));
    assert_eq!(err.stage(), Stage::Ingestion);
}

#[test]
fn missing_header() {
    let err = JsonLinesSource::new(r#"{"event":{"tick":1,"round":1,"kind":"round_start"}}"#.as_bytes())
        .err()
        .unwrap();
    assert!(matches!(err, SourceError::MissingHeader));

    let err = JsonLinesSource::new("not json".as_bytes()).err().unwrap();
    assert!(matches!(err, SourceError::Decode { line: 1, .. }));
}

#[test]
fn out_of_order_ticks_fail_ingestion() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder.round_start(50).kill(40, T1, CT1);

    let err = pipeline::analyse(builder.build().source(), &Settings::default(), &RatingConfig::default())
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Ingestion);
    assert!(err.to_string().contains("tick 40"));
}

#[test]
fn zero_weights_fail_rating() {
    let config = RatingConfig {
        kd: 0.0,
        headshot_pct: 0.0,
        adr: 0.0,
        multikill: 0.0,
        clutch: 0.0,
    };

    let err = pipeline::analyse(busy_match().build().source(), &Settings::default(), &config).unwrap_err();

    assert_eq!(err.stage(), Stage::Rating);
    assert_eq!(err.to_string(), "rating failed: rating weights sum to zero");
}

#[test]
#[traced_test]
fn full_analysis() {
    let analysis =
        pipeline::analyse(busy_match().build().source(), &Settings::default(), &RatingConfig::default()).unwrap();

    assert_eq!(analysis.stats.rounds_played(), 3);
    assert_eq!(analysis.normalized.len(), 6);
    assert_eq!(analysis.ratings.len(), 6);
    assert!(analysis.ratings.iter().all(|r| r.standing.is_some()));

    let best = analysis
        .ratings
        .iter()
        .find(|r| r.standing.unwrap().placement == 1)
        .unwrap();
    assert_eq!(best.player, T1);

    assert!(logs_contain("Aggregated match"));
}

#[test]
fn rerating_reuses_aggregates() {
    let analysis =
        pipeline::analyse(busy_match().build().source(), &Settings::default(), &RatingConfig::default()).unwrap();

    let kd_only = RatingConfig {
        kd: 1.0,
        headshot_pct: 0.0,
        adr: 0.0,
        multikill: 0.0,
        clutch: 0.0,
    };
    let rerated = analysis.rerate(&kd_only).unwrap();

    for (result, normalized) in rerated.iter().zip(analysis.normalized.iter()) {
        assert_eq!(result.player, normalized.player);
        assert_eq!(result.rating, normalized.kd);
    }

    // the defaults give back the original ratings
    assert_eq!(analysis.rerate(&RatingConfig::default()).unwrap(), analysis.ratings);
}

#[test]
fn partitions_at_round_starts() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder
        .shot(0, T1, 0.0)
        .round_start(10)
        .kill(20, T1, CT1)
        .round_end(30, Team::Terrorist)
        .round_start(40)
        .round_end(50, Team::CounterTerrorist);

    let slices = partition_rounds(builder.events()).unwrap();

    assert_eq!(
        slices.iter().map(|s| (s.round, s.events.len())).collect::<Vec<_>>(),
        vec![(None, 1), (Some(1), 3), (Some(2), 2)]
    );
}

#[test]
fn parallel_matches_sequential() {
    let mut builder = busy_match();
    builder.kill(950, T1, PlayerId(404));
    let recording = builder.build();

    let sequential = pipeline::aggregate(recording.source(), &Settings::default()).unwrap();
    let parallel = pipeline::aggregate_parallel(&recording, &Settings::default()).unwrap();

    assert_eq!(parallel.rounds, sequential.rounds);
    assert_eq!(parallel.clutches, sequential.clutches);
    assert_eq!(parallel.multikills, sequential.multikills);
    assert_eq!(parallel.anomalies, sequential.anomalies);
    assert_eq!(parallel.weapons, sequential.weapons);

    for (id, seq) in sequential.metrics.iter() {
        let par = &parallel.metrics[id];
        assert_eq!(par.kills, seq.kills);
        assert_eq!(par.deaths, seq.deaths);
        assert_eq!(par.damage, seq.damage);
        assert_eq!(par.rounds_played, seq.rounds_played);
        assert_eq!(par.multikills, seq.multikills);
        assert_close(par.clutch_credit, seq.clutch_credit);
        assert_close(par.crosshair_error_sum, seq.crosshair_error_sum);
        assert_eq!(par.time_to_damage(), seq.time_to_damage());
    }
}

#[test]
fn parallel_reports_tick_regressions() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder.round_start(50).round_end(60, Team::Terrorist).round_start(55);

    assert!(pipeline::aggregate_parallel(&builder.build(), &Settings::default()).is_err());
}

#[test]
fn restarted_round_numbers_are_kept_apart() {
    let mut builder = MatchBuilder::new(three_v_three());
    builder
        .round_start(0)
        .kill(20, T1, CT1)
        .round_end(50, Team::Terrorist)
        .restart()
        .round_start(100)
        .kill(120, CT1, T1)
        .round_end(150, Team::CounterTerrorist);
    let recording = builder.build();

    let sequential = pipeline::aggregate(recording.source(), &Settings::default()).unwrap();
    let parallel = pipeline::aggregate_parallel(&recording, &Settings::default()).unwrap();

    assert_eq!(
        sequential
            .rounds
            .iter()
            .map(|r| (r.number, r.start_tick, r.winner))
            .collect::<Vec<_>>(),
        vec![
            (1, 0, Some(Team::Terrorist)),
            (1, 100, Some(Team::CounterTerrorist))
        ]
    );
    assert_eq!(sequential.rounds_played(), 2);
    assert_eq!(sequential.metrics[&T1].rounds_played, 2);
    assert_eq!(sequential.metrics[&T1].kills, 1);
    assert_eq!(sequential.metrics[&T1].deaths, 1);
    assert_eq!(parallel, sequential);
}
