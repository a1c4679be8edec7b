use quota_burndown::prelude::*;
use quota_burndown::{ActualSample, ActualSamples, Calculator, HistoryStore, ModelBreakdown};
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    // Optional month argument, e.g. `2024-06`
    let month = match args.get(1) {
        Some(label) => MonthKey::parse(label)?,
        None => MonthKey::from_date(Utc::now().date_naive()),
    };
    let target = 300.0;

    println!("Planning {} against a target of {}", month, target);

    let planner = Planner::new();
    let overrides = OverrideTable::new();
    let planned = planner.plan(target, month.first_day(), month.last_day(), &overrides);

    if planned.is_empty() {
        println!("No working days in {}", month);
        return Ok(());
    }

    let working_days = planner.count_working_days(month.first_day(), month.last_day(), &overrides);
    println!(
        "{} working days, {:.2} per working day",
        working_days,
        target / working_days as f64
    );

    let mid_month = month.first_day() + chrono::Duration::days(14);
    let mut models = ModelBreakdown::new();
    models.insert("gpt-4.1".to_string(), 80.0);
    models.insert("claude-sonnet".to_string(), 45.5);
    let mut actual = ActualSamples::new();
    actual.insert(mid_month, ActualSample::new(125.5, models));

    let history = Reconciler::new().merge(HistoryRecord::new(), &planned, &actual, Utc::now());

    let dir = env::temp_dir().join("quota-burndown-example");
    let store = HistoryStore::new(&dir);
    let path = store.save(month, &history, Utc::now())?;
    store.write_latest(month)?;
    println!("Wrote {}", path.display());

    println!("\n--- Planned vs actual ---");
    for (date, record) in &history {
        let actual = if record.is_observed() {
            format!("{:>8.2}", record.actual)
        } else {
            format!("{:>8}", "-")
        };
        println!("{}  planned {:>8.2}  actual {}", date, record.planned, actual);
    }

    if let Some(summary) = Calculator::new().summarize(&history, mid_month) {
        println!("\n--- Summary as of {} ---", mid_month);
        println!("Planned so far: {:.2}", summary.planned_today());
        println!("Used so far:    {:.2} ({:.1}%)", summary.actual(), summary.usage_percentage());
        if let Some(variance) = summary.variance() {
            println!("Variance:       {:+.2}", variance);
        }
        if let Some(projection) = summary.projected_month_end() {
            println!("Projected:      {:.2}", projection);
        }
    }

    Ok(())
}
