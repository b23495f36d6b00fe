//! # Tied-Weight Autoencoder
//!
//! Demonstrates the core workflow of `gradnet-core`:
//! 1.  **Weight tying**: a `LinearModule` encoder and a
//!     `TransposedLinearModule` decoder sharing the encoder's weight storage
//!     (no copy; the decoder runs the same matrix in the transposed
//!     direction).
//! 2.  **Named sequences**: the network is assembled from `(name, module)`
//!     pairs, so the hidden code is readable by name after a forward pass.
//! 3.  **Manual training cycle**: forward, squared-error loss, backward,
//!     then a hand-rolled gradient-descent step over the flattened
//!     parameter views.
//! 4.  **Gradient checking**: the analytical gradients are verified against
//!     central finite differences before training starts.
//!
//! Run with: `cargo run --example tied_autoencoder`

use gradnet_core::check_gradient;
use gradnet_core::nn::{
    Criterion, Differentiable, Forward, LinearModule, SequenceModule, SigmoidModule,
    SquaredErrorLoss, TransposedLinearModule,
};
use gradnet_core::{GradNetError, Matrix};

const VISIBLE: usize = 8;
const HIDDEN: usize = 3;
const LEARNING_RATE: f64 = 0.5;
const STEPS: usize = 200;

fn build_autoencoder() -> Result<SequenceModule, GradNetError> {
    let encoder = LinearModule::new(VISIBLE, HIDDEN);
    let decoder = TransposedLinearModule::tied(&encoder);
    SequenceModule::with_names(vec![
        ("encode", Box::new(encoder) as Box<dyn Differentiable>),
        ("encode_squash", Box::new(SigmoidModule::new(HIDDEN))),
        ("decode", Box::new(decoder)),
        ("decode_squash", Box::new(SigmoidModule::new(VISIBLE))),
    ])
}

fn main() -> Result<(), GradNetError> {
    let mut autoencoder = build_autoencoder()?;
    let loss = SquaredErrorLoss::new();

    // something with visible structure to reconstruct
    let sample = Matrix::vector(vec![0.9, 0.1, 0.9, 0.1, 0.9, 0.1, 0.9, 0.1]);

    // verify the hand-derived gradients before trusting them
    let discrepancies = check_gradient(
        |module, input| {
            let prediction = module.forward(input)?;
            let value = loss.forward(&prediction, &sample)?;
            let grad = loss.backward(&prediction, &sample)?;
            module.backward(input, &grad)?;
            Ok(value)
        },
        &mut autoencoder,
        &sample,
        1e-4,
    )
    .expect("gradient check could not run");
    let max_discrepancy = discrepancies.iter().cloned().fold(0.0, f64::max);
    println!(
        "gradient check over {} parameter elements, max discrepancy {:.3e}",
        discrepancies.len(),
        max_discrepancy
    );

    // manual gradient-descent loop over the flattened parameter views
    let params = autoencoder.flatten_parameters();
    let derivs = autoencoder.flatten_deriv_parameters();
    for step in 0..STEPS {
        autoencoder.clear();
        let prediction = autoencoder.forward(&sample)?;
        let value = loss.forward(&prediction, &sample)?;
        let grad = loss.backward(&prediction, &sample)?;
        autoencoder.backward(&sample, &grad)?;

        for index in 0..params.numel() {
            let updated = params.get(index)? - LEARNING_RATE * derivs.get(index)?;
            params.set(index, updated)?;
        }

        if step % 50 == 0 {
            println!("step {:>3}: loss {:.6}", step, value);
        }
    }

    let reconstruction = autoencoder.forward(&sample)?;
    let hidden = autoencoder
        .output_by_name("encode_squash")
        .expect("forward pass cached the hidden code");
    println!("input:          {:?}", sample.as_slice());
    println!("hidden code:    {:?}", hidden.as_slice());
    println!("reconstruction: {:?}", reconstruction.as_slice());
    Ok(())
}
