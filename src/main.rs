use anyhow::Result;

use aforoviz::chart;
use aforoviz::data;
use aforoviz::fetch::CsvSource;
use aforoviz::logging::{log, obj, v_num, v_str, Domain, Level};
use aforoviz::state::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    let source = CsvSource::new(&cfg)?;
    let raw = source.fetch_raw().await?;

    let samples = data::parse_csv(&raw)?;
    log(
        Level::Info,
        Domain::Data,
        "csv_parsed",
        obj(&[("rows", v_num(samples.len() as f64))]),
    );

    let plan = chart::plan(&samples)?;
    log(
        Level::Info,
        Domain::Chart,
        "plan_built",
        obj(&[
            ("weeks", v_num(plan.weeks.len() as f64)),
            ("traces", v_num(plan.traces.len() as f64)),
        ]),
    );

    let plot = chart::build_plot(&plan);
    plot.write_html(&cfg.out_html);
    log(
        Level::Info,
        Domain::System,
        "html_written",
        obj(&[("path", v_str(&cfg.out_html))]),
    );

    if cfg.open_view {
        plot.show();
    }

    Ok(())
}
