//! Run the full localization pipeline on the default shoebox room and print
//! the per-direction predictions and the angular RMSE.
//!
//! ```sh
//! RUST_LOG=info cargo run --example localize
//! ```

use echomap::pipeline::LocalizerBuilder;
use echomap::room::ShoeboxRoom;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let room = ShoeboxRoom::default();
    let report = LocalizerBuilder::new()
        .with_sources(50, 49)
        .with_perturbations(5, 0.01)
        .with_feature_bins(9)
        .with_embedding(2)
        .with_neighbors(3)
        .with_seed(7)
        .run(&room)?;

    println!("kernel bandwidth: {:.4e}", report.epsilon);
    println!("embedding eigenvalues: {:?}", report.eigenvalues);
    println!();
    println!("{:>6} {:>12} {:>12} {:>10}", "test", "truth (rad)", "pred (rad)", "err (rad)");
    for (i, (truth, pred)) in report
        .ground_truth
        .iter()
        .zip(report.predictions.iter())
        .enumerate()
    {
        let err = echomap::evaluate::wrap_to_pi(pred.azimuth - truth.azimuth);
        println!(
            "{:>6} {:>12.4} {:>12.4} {:>10.4}",
            i, truth.azimuth, pred.azimuth, err
        );
    }
    println!();
    println!("angular RMSE: {:.4} rad", report.rmse);

    Ok(())
}
