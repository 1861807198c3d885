mod support;

use analysis::aggregate::{aggregate_events, Anomalies, MetricAggregator, WeaponTally};
use analysis::event::{Event, EventKind, OrderingError, PlayerId, Team, ViewAngles};
use analysis::Settings;
use pretty_assertions::assert_eq;
use support::*;
use tracing_test::traced_test;

fn kill_with_assist(builder: &mut MatchBuilder, tick: u32, attacker: PlayerId, victim: PlayerId, assister: PlayerId) {
    builder.event(
        tick,
        EventKind::Kill {
            attacker: Some(attacker),
            victim,
            assister: Some(assister),
            headshot: false,
            weapon: None,
            attacker_view: None,
        },
    );
}

#[test]
fn basic_counters() {
    let mut builder = MatchBuilder::new(three_v_three());
    builder
        .round_start(0)
        .damage(5, T1, CT1, 60)
        .headshot(10, T1, CT1)
        .damage(15, T1, CT2, 40)
        .kill(20, T1, CT2)
        .round_end(30, Team::Terrorist)
        .round_start(100)
        .damage(105, CT3, T1, 100)
        .kill(110, CT3, T1)
        .round_end(200, Team::CounterTerrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();
    let t1 = &stats.metrics[&T1];

    assert_eq!(t1.kills, 2);
    assert_eq!(t1.deaths, 1);
    assert_eq!(t1.headshot_kills, 1);
    assert_eq!(t1.damage, 100);
    assert_eq!(t1.rounds_played, 2);
    assert_eq!(t1.kd_ratio(), 2.0);
    assert_eq!(t1.headshot_pct(), 50.0);
    assert_eq!(t1.adr(), 50.0);

    assert_eq!(stats.metrics[&CT2].deaths, 1);
    assert_eq!(stats.metrics[&CT3].kd_ratio(), 1.0);
    assert_eq!(stats.rounds_played(), 2);
    assert_eq!(stats.anomalies, Anomalies::default());
}

#[test]
fn kd_without_deaths_is_kill_count() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder
        .round_start(0)
        .kill(10, T1, CT1)
        .round_end(20, Team::Terrorist)
        .round_start(30)
        .kill(40, T1, CT1)
        .round_end(50, Team::Terrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();

    assert_eq!(stats.metrics[&T1].kd_ratio(), 2.0);
    assert_eq!(stats.metrics[&CT1].kd_ratio(), 0.0);
    assert_eq!(stats.metrics[&CT1].headshot_pct(), 0.0);
}

#[test]
fn adr_is_zero_without_completed_rounds() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder.round_start(0).damage(10, T1, CT1, 80);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();

    assert_eq!(stats.metrics[&T1].damage, 80);
    assert_eq!(stats.metrics[&T1].rounds_played, 0);
    assert_eq!(stats.metrics[&T1].adr(), 0.0);
}

#[test]
fn friendly_fire_is_kept_apart() {
    let mut builder = MatchBuilder::new(three_v_three());
    builder
        .round_start(0)
        .damage(5, T1, T2, 30)
        .damage(6, T1, T1, 10)
        .kill(10, T1, T2)
        .kill(20, T3, T3)
        .round_end(30, Team::CounterTerrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();

    let t1 = &stats.metrics[&T1];
    assert_eq!(t1.kills, 0);
    assert_eq!(t1.team_kills, 1);
    assert_eq!(t1.damage, 0);
    assert_eq!(t1.team_damage, 30);
    assert_eq!(t1.self_damage, 10);

    let t3 = &stats.metrics[&T3];
    assert_eq!(t3.suicides, 1);
    assert_eq!(t3.deaths, 1);
    assert_eq!(stats.metrics[&T2].deaths, 1);
}

#[test]
fn assists_only_on_enemies() {
    let mut builder = MatchBuilder::new(three_v_three());
    builder.round_start(0);
    kill_with_assist(&mut builder, 10, T1, CT1, T2);
    kill_with_assist(&mut builder, 20, T1, T3, CT2);
    builder.round_end(30, Team::Terrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();

    assert_eq!(stats.metrics[&T2].assists, 1);
    // CT2 helped kill an enemy of theirs
    assert_eq!(stats.metrics[&CT2].assists, 1);

    let mut builder = MatchBuilder::new(three_v_three());
    builder.round_start(0);
    kill_with_assist(&mut builder, 10, CT1, CT2, CT3);
    builder.round_end(30, Team::Terrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();
    assert_eq!(stats.metrics[&CT3].assists, 0);
}

#[test]
fn weapon_tallies() {
    let mut builder = MatchBuilder::new(three_v_three());
    builder
        .round_start(0)
        .headshot(10, T1, CT1)
        .kill(20, T1, CT2)
        .kill_aiming(30, T1, CT3, ViewAngles::new(0.0, 0.0))
        .round_end(40, Team::Terrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();
    let weapons = &stats.weapons[&T1];

    assert_eq!(
        weapons["ak47"],
        WeaponTally {
            kills: 2,
            headshot_kills: 1
        }
    );
    assert_eq!(weapons["deagle"].kills, 1);
}

#[test]
#[traced_test]
fn unknown_players_are_dropped() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder
        .round_start(0)
        .kill(10, PlayerId(99), CT1)
        .damage(12, T1, PlayerId(98), 20)
        .round_end(20, Team::Terrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();

    assert_eq!(stats.anomalies.unknown_player, 2);
    assert_eq!(stats.metrics[&CT1].deaths, 0);
    assert_eq!(stats.metrics[&T1].damage, 0);
    assert!(!stats.metrics.contains_key(&PlayerId(99)));
    assert!(logs_contain("Dropping event for unknown player"));
}

#[test]
fn events_outside_their_round_are_dropped() {
    let header = one_v_one();
    let events = vec![
        Event::new(0, 0, EventKind::ShotFired {
            shooter: T1,
            view: ViewAngles::new(0.0, 0.0),
        }),
        Event::new(10, 1, EventKind::RoundStart),
        Event::new(20, 2, EventKind::Damage {
            attacker: Some(T1),
            victim: CT1,
            amount: 50,
        }),
        Event::new(30, 1, EventKind::Damage {
            attacker: Some(T1),
            victim: CT1,
            amount: 25,
        }),
        Event::new(40, 1, EventKind::RoundEnd {
            winner: Some(Team::Terrorist),
            reason: analysis::event::EndReason::TSaved,
        }),
        Event::new(50, 1, EventKind::Damage {
            attacker: Some(T1),
            victim: CT1,
            amount: 25,
        }),
    ];

    let stats = aggregate_events(&header, Settings::default(), &events).unwrap();

    assert_eq!(
        stats.anomalies,
        Anomalies {
            unknown_player: 0,
            round_mismatch: 1,
            outside_round: 2,
            repeated_elimination: 0,
        }
    );
    assert_eq!(stats.metrics[&T1].damage, 25);
}

#[test]
fn second_elimination_of_same_player_is_ignored() {
    let mut builder = MatchBuilder::new(three_v_three());
    builder
        .round_start(0)
        .kill(10, T1, CT1)
        .kill(11, T2, CT1)
        .round_end(20, Team::Terrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();

    assert_eq!(stats.anomalies.repeated_elimination, 1);
    assert_eq!(stats.metrics[&CT1].deaths, 1);
    assert_eq!(stats.metrics[&T2].kills, 0);
}

#[test]
fn tick_regression_is_fatal() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder.round_start(100).damage(50, T1, CT1, 10);

    let result = aggregate_events(builder.header(), Settings::default(), builder.events());
    assert_eq!(
        result,
        Err(OrderingError {
            tick: 50,
            last_seen: 100
        })
    );
}

#[test]
fn tick_regression_is_fatal_for_dropped_events_too() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder.round_start(100).damage(50, T1, PlayerId(77), 10);

    let result = aggregate_events(builder.header(), Settings::default(), builder.events());
    assert!(result.is_err());
}

#[test]
fn crosshair_placement() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder
        .round_start(0)
        .visible(100, T1, CT1)
        .shot(110, T1, 10.0)
        .kill_aiming(120, T1, CT1, ViewAngles::new(0.0, 0.0))
        .round_end(130, Team::Terrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();

    let t1 = &stats.metrics[&T1];
    assert_eq!(t1.crosshair_samples, 2);
    assert_close(t1.crosshair_error().unwrap(), 5.0);
    assert_eq!(stats.metrics[&CT1].crosshair_error(), None);
}

#[test]
fn crosshair_ignores_stale_and_hidden_samples() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder
        .round_start(0)
        .visible(100, T1, CT1)
        .shot(165, T1, 0.0)
        .hidden(170, CT1, T1)
        .shot(171, CT1, 0.0)
        .round_end(200, Team::Terrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();

    assert_eq!(stats.metrics[&T1].crosshair_error(), None);
    assert_eq!(stats.metrics[&CT1].crosshair_error(), None);
}

#[test]
fn sightings_do_not_carry_over_rounds() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder
        .round_start(0)
        .visible(100, T1, CT1)
        .round_end(101, Team::Terrorist)
        .round_start(102)
        .shot(103, T1, 0.0)
        .damage(104, T1, CT1, 10)
        .round_end(110, Team::Terrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();

    assert_eq!(stats.metrics[&T1].crosshair_samples, 0);
    assert_eq!(stats.metrics[&T1].time_to_damage(), None);
}

#[test]
fn time_to_damage_from_first_sighting() {
    let mut builder = MatchBuilder::new(one_v_one());
    builder
        .round_start(0)
        .visible(100, T1, CT1)
        .visible(110, T1, CT1)
        .damage(130, T1, CT1, 27)
        .round_end(200, Team::Terrorist);

    let stats = aggregate_events(builder.header(), Settings::default(), builder.events()).unwrap();

    assert_eq!(stats.metrics[&T1].time_to_damage(), Some(30.0));
}

#[test]
fn time_to_damage_lapse_boundary() {
    // a gap of exactly the tolerance keeps the engagement
    let mut kept = MatchBuilder::new(one_v_one());
    kept.round_start(0)
        .visible(100, T1, CT1)
        .visible(132, T1, CT1)
        .damage(140, T1, CT1, 27)
        .round_end(200, Team::Terrorist);
    let stats = aggregate_events(kept.header(), Settings::default(), kept.events()).unwrap();
    assert_eq!(stats.metrics[&T1].time_to_damage(), Some(40.0));

    // one tick more starts a new engagement
    let mut reset = MatchBuilder::new(one_v_one());
    reset
        .round_start(0)
        .visible(100, T1, CT1)
        .visible(133, T1, CT1)
        .damage(140, T1, CT1, 27)
        .round_end(200, Team::Terrorist);
    let stats = aggregate_events(reset.header(), Settings::default(), reset.events()).unwrap();
    assert_eq!(stats.metrics[&T1].time_to_damage(), Some(7.0));

    // damage long after the target was last seen has no sample
    let mut lost = MatchBuilder::new(one_v_one());
    lost.round_start(0)
        .visible(100, T1, CT1)
        .damage(200, T1, CT1, 27)
        .round_end(300, Team::Terrorist);
    let stats = aggregate_events(lost.header(), Settings::default(), lost.events()).unwrap();
    assert_eq!(stats.metrics[&T1].time_to_damage(), None);
}

#[test]
fn snapshot_mid_round() {
    let mut builder = MatchBuilder::new(three_v_three());
    builder
        .round_start(0)
        .kill(10, T1, CT1)
        .kill(20, T1, CT2)
        .kill(30, CT3, T2)
        .kill(40, CT3, T3);

    let mut aggregator = MetricAggregator::new(builder.header(), Settings::default());
    for event in builder.events() {
        aggregator.ingest(event).unwrap();
    }

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.metrics[&T1].kills, 2);
    assert_eq!(snapshot.metrics[&T1].multikills(2), 1);
    assert!(snapshot.clutches.is_empty());
    assert_eq!(snapshot.rounds_played(), 0);

    assert_eq!(aggregator.tracker().alive_count(Team::CounterTerrorist, 1), 1);
    assert_eq!(aggregator.anomalies().total(), 0);
}
