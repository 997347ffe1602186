use std::path::PathBuf;

use anyhow::Result;
use fraud_classifiers::config::PipelineConfig;
use fraud_classifiers::evaluation::print_evaluation;
use fraud_classifiers::models::get_all_models_with_seed;
use fraud_classifiers::pipeline::{prepare_data, train_and_evaluate};
use fraud_classifiers::report::plots::{plot_probability_histogram, plot_roc_curve};
use fraud_classifiers::stats::roc_curve;

/// Usage: credit_card_fraud <creditcard.csv> [config.json] [output_dir]
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let data_path = args
        .next()
        .unwrap_or_else(|| "data/creditcard.csv".to_string());
    let config = match args.next() {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "fraud_report".to_string()));
    std::fs::create_dir_all(&output_dir)?;

    let prepared = prepare_data(&data_path, &config)?;
    println!(
        "Train: {} rows after SMOTE, test: {} rows, {} features",
        prepared.x_train.nrows(),
        prepared.x_test.nrows(),
        prepared.feature_names.len()
    );

    let mut models = get_all_models_with_seed(config.random_state);
    let reports = train_and_evaluate(&mut models, &prepared, &config)?;
    for report in &reports {
        println!("\n==== {} ====", report.name);
        print_evaluation(&report.evaluation);
        println!(
            "Business cost (fp = {}, fn = {}): {:.1}",
            config.cost_fp, config.cost_fn, report.business_cost
        );
    }

    for (name, model) in &models {
        let Some(probabilistic) = model.as_probabilistic() else {
            continue;
        };
        let proba = probabilistic.predict_proba(&prepared.x_test)?;
        let curve = roc_curve(&prepared.y_test, &proba)?;
        let slug = name.to_lowercase().replace(' ', "_");

        let roc = plot_roc_curve(&curve, name, &format!("ROC curve: {}", name))
            .map_err(anyhow::Error::msg)?;
        roc.write_html(output_dir.join(format!("{}_roc.html", slug)));

        let hist = plot_probability_histogram(
            &proba,
            &prepared.y_test,
            &format!("Fraud probability: {}", name),
        )
        .map_err(anyhow::Error::msg)?;
        hist.write_html(output_dir.join(format!("{}_proba.html", slug)));
    }
    println!("\nPlots written to {}", output_dir.display());

    Ok(())
}
