use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::aggregate::{StatSummary, TeamAggregate, TeamSplits};
use crate::backtest::{BacktestResult, BacktestSummary, EvaluationStatus, Tally};
use crate::form::FormSummary;
use crate::normalize::team_view;
use crate::player::RankedPlayer;
use crate::predict::{ConfidenceBand, Fixture, Market, Prediction};
use crate::records::{MatchRecord, StatKind};

/// Statistics shown in team reports, in display order.
const REPORT_STATS: [StatKind; 14] = [
    StatKind::Goals,
    StatKind::HalfTimeGoals,
    StatKind::ExpectedGoals,
    StatKind::Shots,
    StatKind::ShotsOnTarget,
    StatKind::Corners,
    StatKind::FirstHalfCorners,
    StatKind::SecondHalfCorners,
    StatKind::Cards,
    StatKind::Fouls,
    StatKind::Offsides,
    StatKind::Possession,
    StatKind::Attacks,
    StatKind::DangerousAttacks,
];

pub fn render_team_report(splits: &TeamSplits, form: Option<&FormSummary>) -> String {
    let mut lines = Vec::new();
    let overall = &splits.overall;
    let name = overall.team_name.as_deref().unwrap_or("Unknown");
    lines.push(format!("{name} (team {})", overall.team_id));
    lines.push("=".repeat(72));

    for (label, agg) in [
        ("Overall", &splits.overall),
        ("Home", &splits.home),
        ("Away", &splits.away),
    ] {
        lines.push(summary_line(label, agg));
    }
    lines.push(String::new());

    if let Some(rates) = overall.rates {
        lines.push(format!(
            "Clean sheets {:.1}% | Failed to score {:.1}% | BTTS {:.1}% | O1.5 {:.1}% | O2.5 {:.1}%",
            rates.clean_sheet_pct,
            rates.failed_to_score_pct,
            rates.btts_pct,
            rates.over_15_pct,
            rates.over_25_pct
        ));
        lines.push(String::new());
    }

    lines.push(format!(
        "{:<20} {:>8} {:>8} {:>10} {:>12}",
        "Stat", "For", "Against", "Match", "Range"
    ));
    for kind in REPORT_STATS {
        let own = overall.own.get(&kind);
        let against = overall.opponent.get(&kind);
        let total = overall.match_totals.get(&kind);
        if own.is_none() && against.is_none() {
            continue;
        }
        lines.push(format!(
            "{:<20} {:>8} {:>8} {:>10} {:>12}",
            kind.label(),
            fmt_avg(own),
            fmt_avg(against),
            fmt_avg(total),
            fmt_range(own)
        ));
    }

    if let Some(form) = form {
        lines.push(String::new());
        lines.push(format!("Form (last 10): {}", form.form_string()));
        lines.push(format!(
            "PPG last 3/5/10: {} / {} / {}",
            fmt_opt(form.ppg_last3),
            fmt_opt(form.ppg_last5),
            fmt_opt(form.ppg_last10)
        ));
        if let Some(momentum) = form.momentum {
            lines.push(format!(
                "Momentum: {momentum}/100 ({})",
                form.trend
                    .map(|t| format!("{t:?}").to_lowercase())
                    .unwrap_or_else(|| "n/a".to_string())
            ));
        }
        lines.push(format!(
            "Home last 5: {} | Away last 5: {}",
            crate::form::form_string(&form.home_form),
            crate::form::form_string(&form.away_form)
        ));
    }
    lines.join("\n")
}

/// Score line and team-relative key stats for a previous meeting.
pub fn render_meeting(record: &MatchRecord, team_id: u32) -> String {
    let Ok(view) = team_view(record, team_id) else {
        return String::new();
    };
    let (Some(gf), Some(ga)) = (view.goals_for(), view.goals_against()) else {
        return format!("vs {}: no score recorded", view.opponent_name());
    };
    let venue = if view.is_home() { "H" } else { "A" };
    let mut lines = vec![format!(
        "Last meeting ({venue}) vs {}: {gf}-{ga}{}",
        view.opponent_name(),
        record
            .game_week
            .map(|gw| format!(" (GW{gw})"))
            .unwrap_or_default()
    )];
    for kind in [
        StatKind::Shots,
        StatKind::ShotsOnTarget,
        StatKind::Corners,
        StatKind::Cards,
        StatKind::Possession,
    ] {
        let own = view.own_stat(kind);
        let opp = view.opponent_stat(kind);
        if own.is_none() && opp.is_none() {
            continue;
        }
        lines.push(format!(
            "  {:<18} {:>5} - {:<5}",
            kind.label(),
            fmt_opt(own),
            fmt_opt(opp)
        ));
    }
    lines.join("\n")
}

pub fn render_top_players(title: &str, ranked: &[RankedPlayer<'_>]) -> String {
    let mut lines = vec![title.to_string()];
    if ranked.is_empty() {
        lines.push("  (none)".to_string());
    }
    for (idx, r) in ranked.iter().enumerate() {
        lines.push(format!(
            "  {}. {:<24} {:>6.2}  ({} min)",
            idx + 1,
            r.player.name,
            r.value,
            r.player.minutes
        ));
    }
    lines.join("\n")
}

pub fn render_backtest_report(summary: &BacktestSummary, player_names: &BTreeMap<u32, String>) -> String {
    let mut lines = Vec::new();
    for run in &summary.runs {
        lines.push(render_run(run, player_names));
        lines.push(String::new());
    }
    lines.push(format!("Total: {}", tally_line(&summary.tally)));
    for (label, tally) in &summary.by_market {
        lines.push(format!("  {:<12} {}", label, tally_line(tally)));
    }
    lines.join("\n")
}

fn render_run(run: &BacktestResult, player_names: &BTreeMap<u32, String>) -> String {
    let mut lines = vec![format!(
        "GW{} backtest: {} training matches, {} held-out, {} fixtures",
        run.cutoff,
        run.training_matches,
        run.held_out_matches,
        run.fixtures.len()
    )];
    if run.status == EvaluationStatus::NoEvaluationData {
        lines.push(format!(
            "  no evaluation data ({} predictions unresolved)",
            run.predictions.len()
        ));
        return lines.join("\n");
    }
    let fixtures: BTreeMap<u64, &Fixture> = run.fixtures.iter().map(|f| (f.match_id, f)).collect();
    for e in &run.evaluations {
        let fixture = fixtures
            .get(&e.prediction.match_id)
            .map(|f| format!("{} v {}", f.home_name, f.away_name))
            .unwrap_or_else(|| format!("match {}", e.prediction.match_id));
        lines.push(format!(
            "  {:<36} {:<28} {:>3}% {:<10} actual={:<5} {}",
            fixture,
            describe(&e.prediction, player_names),
            e.prediction.confidence,
            band_label(e.prediction.confidence),
            e.actual.map(|a| format!("{a}")).unwrap_or_else(|| "-".to_string()),
            e.verdict
        ));
    }
    lines.push(format!("  {}", tally_line(&run.tally)));
    lines.join("\n")
}

fn describe(p: &Prediction, player_names: &BTreeMap<u32, String>) -> String {
    let player = |id: u32| {
        player_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{id}"))
    };
    match p.market {
        Market::PlayerToScore { player_id } => format!("{} to score", player(player_id)),
        Market::PlayerToBeBooked { player_id } => format!("{} booked", player(player_id)),
        market => format!("{} {}", market.label(), p.selection),
    }
}

fn band_label(confidence: u8) -> &'static str {
    match ConfidenceBand::of(confidence) {
        ConfidenceBand::UltraSafe => "ultra-safe",
        ConfidenceBand::Safe => "safe",
        ConfidenceBand::Risky => "risky",
        ConfidenceBand::TooRisky => "too-risky",
    }
}

fn tally_line(t: &Tally) -> String {
    format!(
        "{} correct / {} incorrect / {} unresolved, accuracy {}",
        t.correct,
        t.incorrect,
        t.unresolved,
        t.accuracy
            .map(|a| format!("{a:.1}%"))
            .unwrap_or_else(|| "n/a".to_string())
    )
}

fn summary_line(label: &str, agg: &TeamAggregate) -> String {
    let Some(rates) = agg.rates else {
        return format!("{label:<8} no matches");
    };
    let c = &agg.counts;
    format!(
        "{label:<8} P{} W{} D{} L{}  GF{} GA{}  PPG {:.2}  GF/m {:.2}  GA/m {:.2}",
        c.played,
        c.won,
        c.drawn,
        c.lost,
        c.goals_scored,
        c.goals_conceded,
        rates.points_per_game,
        rates.goals_per_match,
        rates.conceded_per_match
    )
}

fn fmt_avg(s: Option<&StatSummary>) -> String {
    fmt_opt(s.and_then(|s| s.average))
}

fn fmt_range(s: Option<&StatSummary>) -> String {
    match s.and_then(|s| Some((s.min?, s.max?))) {
        Some((min, max)) => format!("{min}-{max}"),
        None => "-".to_string(),
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "-".to_string())
}

pub struct ExportReport {
    pub runs: usize,
    pub evaluations: usize,
}

/// Writes `Runs`, `Predictions` and `Markets` sheets.
pub fn export_backtest_xlsx(
    path: &Path,
    summary: &BacktestSummary,
    player_names: &BTreeMap<u32, String>,
) -> Result<ExportReport> {
    let mut runs_rows = vec![vec![
        "Gameweek".to_string(),
        "Status".to_string(),
        "Training".to_string(),
        "Held out".to_string(),
        "Correct".to_string(),
        "Incorrect".to_string(),
        "Unresolved".to_string(),
        "Accuracy %".to_string(),
    ]];
    let mut prediction_rows = vec![vec![
        "Gameweek".to_string(),
        "Match ID".to_string(),
        "Fixture".to_string(),
        "Market".to_string(),
        "Selection".to_string(),
        "Confidence".to_string(),
        "Actual".to_string(),
        "Verdict".to_string(),
    ]];
    let mut market_rows = vec![vec![
        "Market".to_string(),
        "Correct".to_string(),
        "Incorrect".to_string(),
        "Unresolved".to_string(),
        "Accuracy %".to_string(),
    ]];

    for run in &summary.runs {
        runs_rows.push(vec![
            run.cutoff.to_string(),
            format!("{:?}", run.status),
            run.training_matches.to_string(),
            run.held_out_matches.to_string(),
            run.tally.correct.to_string(),
            run.tally.incorrect.to_string(),
            run.tally.unresolved.to_string(),
            run.tally.accuracy.map(|a| format!("{a:.2}")).unwrap_or_default(),
        ]);
        let fixtures: BTreeMap<u64, &Fixture> =
            run.fixtures.iter().map(|f| (f.match_id, f)).collect();
        for e in &run.evaluations {
            prediction_rows.push(vec![
                run.cutoff.to_string(),
                e.prediction.match_id.to_string(),
                fixtures
                    .get(&e.prediction.match_id)
                    .map(|f| format!("{} v {}", f.home_name, f.away_name))
                    .unwrap_or_default(),
                describe(&e.prediction, player_names),
                e.prediction.selection.to_string(),
                e.prediction.confidence.to_string(),
                e.actual.map(|a| a.to_string()).unwrap_or_default(),
                e.verdict.to_string(),
            ]);
        }
    }
    for (label, t) in &summary.by_market {
        market_rows.push(vec![
            label.clone(),
            t.correct.to_string(),
            t.incorrect.to_string(),
            t.unresolved.to_string(),
            t.accuracy.map(|a| format!("{a:.2}")).unwrap_or_default(),
        ]);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Runs")?;
        write_rows(sheet, &runs_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Predictions")?;
        write_rows(sheet, &prediction_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Markets")?;
        write_rows(sheet, &market_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        runs: summary.runs.len(),
        evaluations: prediction_rows.len().saturating_sub(1),
    })
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
