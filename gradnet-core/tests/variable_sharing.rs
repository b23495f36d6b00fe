mod common;

use gradnet_core::nn::LinearParams;
use gradnet_core::utils::testing::is_close;
use gradnet_core::{Matrix, Shape, Variable};

#[test]
fn vector_variable_fill() {
    let var = Variable::zeros(Shape::Vector(5));
    var.ones();
    let expected = Matrix::vector(vec![1.0, 1.0, 1.0, 1.0, 1.0]);
    assert!(is_close(&var.to_matrix(), &expected, 1e-12));
}

#[test]
fn matrix_variable_fill() {
    let var = Variable::zeros(Shape::Matrix(5, 5));
    var.ones();
    let expected = Matrix::full(5, 5, 1.0);
    assert!(is_close(&var.to_matrix(), &expected, 1e-12));
}

#[test]
fn shared_variable_observes_mutations_both_ways() {
    let var1 = Variable::zeros(Shape::Matrix(5, 5));
    // tell var2 to share the storage of var1
    let var2 = var1.share();

    // if we change var1, var2 should change
    var1.ones();
    assert!(is_close(&var2.to_matrix(), &var1.to_matrix(), 1e-12));

    // and vice versa
    var2.zero();
    assert!(is_close(&var2.to_matrix(), &var1.to_matrix(), 1e-12));
}

struct Holder {
    var: Variable,
}

#[test]
fn shared_variable_survives_being_moved_into_a_struct() {
    let var = Variable::zeros(Shape::Matrix(5, 5));

    let holder = Holder { var: var.share() };
    var.zero();
    assert!(is_close(&var.to_matrix(), &holder.var.to_matrix(), 1e-12));

    let holder2 = Holder { var: var.share() };
    var.ones();
    assert!(is_close(&var.to_matrix(), &holder2.var.to_matrix(), 1e-12));
}

#[test]
fn shared_variable_keeps_the_buffer_alive() {
    let alias = {
        let original = Variable::zeros(Shape::Vector(3));
        original.fill(4.0);
        original.share()
    };
    assert_eq!(alias.to_matrix().as_slice(), &[4.0, 4.0, 4.0]);
}

#[test]
fn linear_params_with_shared_weight_track_the_source() {
    let params = LinearParams::with_extent(3, 5);
    let shared = LinearParams::new(
        params.weight.share(),
        Variable::zeros(Shape::Vector(params.input_extent())),
    );
    params.weight.ones();

    // make sure the shared bundle matches the source bundle
    assert!(is_close(
        &shared.weight.to_matrix(),
        &params.weight.to_matrix(),
        1e-12
    ));
    assert!(Variable::same_storage(&params.weight, &shared.weight));
    assert!(!Variable::same_storage(&params.bias, &shared.bias));
}
