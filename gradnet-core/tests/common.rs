use gradnet_core::nn::{
    Differentiable, LinearModule, SequenceModule, SigmoidModule, TransposedLinearModule,
};

/// Builds the reference tied-weight autoencoder: an encoder Linear, its
/// transposed decoder sharing the encoder's weight storage, and a sigmoid
/// after each of the two.
// Made public for the integration suites; not every suite uses it, hence
// the dead_code allowance.
#[allow(dead_code)]
pub fn tied_autoencoder(visible: usize, hidden: usize) -> SequenceModule {
    let encoder = LinearModule::new(visible, hidden);
    let decoder = TransposedLinearModule::tied(&encoder);
    SequenceModule::with_names(vec![
        ("encode", Box::new(encoder) as Box<dyn Differentiable>),
        ("encode_squash", Box::new(SigmoidModule::new(hidden))),
        ("decode", Box::new(decoder)),
        ("decode_squash", Box::new(SigmoidModule::new(visible))),
    ])
    .expect("autoencoder wiring is shape-consistent")
}
