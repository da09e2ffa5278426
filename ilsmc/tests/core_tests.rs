mod common;

use std::collections::HashMap;

use statrs::distribution::{ContinuousCDF, Exp};

use ilsmc_core::propagator::check_stochastic;
use ilsmc_core::state_space::join;
use ilsmc_core::{
    transition_table, Branch, Composer, ErrorKind, HiddenState, ModelParams, TransitionTable,
};

use crate::common::{assert_close, probability};

#[test]
fn documented_scenario() {
    let table = transition_table(&ModelParams::default()).unwrap();

    assert_eq!(table.states().len(), 27);
    assert_eq!(table.triples().len(), 729);
    assert_eq!(table.states().iter().last(), Some(&HiddenState::new(3, 2, 2)));

    assert_close(probability(&table, (0, 0, 0), (0, 0, 0)), 0.017102917093677363, 1e-6);
    assert_close(probability(&table, (0, 0, 0), (0, 0, 1)), 0.010521074056740732, 1e-6);
    assert_close(probability(&table, (0, 0, 1), (0, 0, 0)), 0.010521074056740732, 1e-6);
    assert_close(probability(&table, (0, 0, 0), (0, 0, 2)), 0.010521074056740768, 1e-6);
    assert_close(probability(&table, (0, 0, 0), (0, 1, 0)), 0.003847859258137626, 1e-6);
    assert_close(probability(&table, (0, 0, 0), (0, 1, 1)), 0.00235945946352428, 1e-6);

    let triples = table.triples();
    assert_eq!(triples[0].from, HiddenState::new(0, 0, 0));
    assert_eq!(triples[0].to, HiddenState::new(0, 0, 0));
    assert_eq!(triples[1].to, HiddenState::new(0, 0, 1));
    assert_eq!(triples[728].from, HiddenState::new(3, 2, 2));
}

#[test]
fn joint_table_is_a_symmetric_distribution() {
    let table = transition_table(&ModelParams::default()).unwrap();
    let joint = table.joint();

    assert_close(table.total(), 1.0, 1e-9);
    assert!(joint.iter().all(|p| (0.0..=1.0).contains(p)));

    for i in 0..joint.nrows() {
        for j in 0..i {
            assert_close(joint[[i, j]], joint[[j, i]], 1e-10);
        }
    }
}

#[test]
fn conditional_rows_sum_to_one() {
    let table = transition_table(&ModelParams::default()).unwrap();
    assert_close(table.marginals().sum(), 1.0, 1e-9);

    let p = table.transition_matrix();
    assert!(check_stochastic(p.view(), 1e-6).is_ok());

    let conditional = table.conditional_triples();
    assert_eq!(conditional.len(), 729);
    assert!(conditional.iter().all(|t| (0.0..=1.0).contains(&t.probability)));
}

#[test]
fn intermediate_matrices_are_stochastic() {
    let params = ModelParams::default();
    let composer = Composer::new(&params).unwrap();

    for branch in [Branch::AB, Branch::ABC] {
        for p in composer.interval_transitions(branch).unwrap() {
            assert!(check_stochastic(p.view(), 1e-6).is_ok());
            assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }
}

// Single locus probabilities for linked loci, from the exponential waiting times
fn single_locus(params: &ModelParams, state: &HiddenState) -> f64 {
    let c = params.coal_abc;
    let n_ab = params.n_int_ab as f64;
    let n_abc = params.n_int_abc as f64;
    let in_ab = Exp::new(params.coal_ab).unwrap().cdf(params.t_ab);

    let tau = |k: usize| match k == params.n_int_abc {
        true => f64::INFINITY,
        false => -(1.0 - k as f64 / n_abc).ln() / c,
    };
    let surv = |rate: f64, t: f64| match t.is_infinite() {
        true => 0.0,
        false => (-rate * c * t).exp(),
    };

    if state.topology == 0 {
        return in_ab / n_ab / n_abc;
    }

    let deep = (1.0 - in_ab) / 3.0;
    let (l, big_l) = (state.first, state.second);
    if l < big_l {
        let first = surv(2.0, tau(l)) - surv(2.0, tau(l + 1));
        let second = surv(1.0, tau(big_l)) - surv(1.0, tau(big_l + 1));
        deep * 1.5 * first * second
    } else {
        let (a, b) = (tau(l), tau(l + 1));
        deep * ((surv(3.0, a) - surv(3.0, b)) - 1.5 * surv(1.0, b) * (surv(2.0, a) - surv(2.0, b)))
    }
}

#[test]
fn without_recombination_loci_share_one_genealogy() {
    let params = ModelParams {
        rho_a: 0.0,
        rho_b: 0.0,
        rho_ab: 0.0,
        rho_c: 0.0,
        rho_abc: 0.0,
        ..Default::default()
    };
    let table = transition_table(&params).unwrap();
    let joint = table.joint();

    for (i, from) in table.states().iter().enumerate() {
        for (j, _) in table.states().iter().enumerate() {
            if i != j {
                assert!(joint[[i, j]] < 1e-12);
            }
        }
        assert_close(joint[[i, i]], single_locus(&params, from), 1e-9);
    }
    assert_close(table.total(), 1.0, 1e-9);
}

fn aggregate(
    fine: &TransitionTable,
    coarse: &TransitionTable,
    map: impl Fn(&HiddenState) -> HiddenState,
) -> HashMap<(HiddenState, HiddenState), f64> {
    let mut sums = HashMap::new();
    for t in fine.triples() {
        *sums.entry((map(&t.from), map(&t.to))).or_insert(0.0) += t.probability;
    }
    for from in coarse.states().iter() {
        for to in coarse.states().iter() {
            assert!(sums.contains_key(&(*from, *to)), "{from} -> {to} has no refined states");
        }
    }
    sums
}

#[test]
fn refining_ab_preserves_coarse_mass() {
    let coarse = transition_table(&ModelParams::default()).unwrap();
    let fine_params = ModelParams { n_int_ab: 6, ..Default::default() };
    let fine = transition_table(&fine_params).unwrap();
    assert_eq!(fine.states().len(), 36);

    let sums = aggregate(&fine, &coarse, |s| match s.topology {
        0 => HiddenState::new(0, s.first / 2, s.second),
        _ => *s,
    });
    for t in coarse.triples() {
        assert_close(sums[&(t.from, t.to)], t.probability, 1e-9);
    }
}

#[test]
fn refining_abc_preserves_coarse_mass() {
    let coarse = transition_table(&ModelParams::default()).unwrap();
    let fine_params = ModelParams { n_int_abc: 6, ..Default::default() };
    let fine = transition_table(&fine_params).unwrap();

    let sums = aggregate(&fine, &coarse, |s| match s.topology {
        0 => HiddenState::new(0, s.first, s.second / 2),
        t => HiddenState::new(t, s.first / 2, s.second / 2),
    });
    for t in coarse.triples() {
        assert_close(sums[&(t.from, t.to)], t.probability, 1e-9);
    }
}

#[test]
fn repeated_runs_are_identical() {
    let params = ModelParams::default();
    let first = transition_table(&params).unwrap().triples();
    let second = transition_table(&params).unwrap().triples();
    assert_eq!(first, second);
}

#[test]
fn degenerate_ab_branch_joins_at_the_root() {
    let params = ModelParams { t_ab: 0.0, ..Default::default() };
    let composer = Composer::new(&params).unwrap();
    let spaces = composer.spaces();

    let [a, b, c] = composer.leaves().unwrap();
    let ab = join(&spaces.a, a.view(), &spaces.b, b.view(), &spaces.ab).unwrap();
    let direct = join(&spaces.ab, ab.view(), &spaces.c, c.view(), &spaces.abc).unwrap();

    let entry = composer.root_entry().unwrap();
    // nothing can coalesce on a branch of length zero
    assert_eq!(entry.len(), 1);
    for (x, y) in entry.collapse().iter().zip(direct.iter()) {
        assert_close(*x, *y, 1e-12);
    }

    let table = composer.run().unwrap();
    assert_close(table.total(), 1.0, 1e-9);
    for (i, state) in table.states().iter().enumerate() {
        if !state.is_deep() {
            assert_eq!(table.marginals()[i], 0.0);
        }
    }
}

#[test]
fn error_kinds() {
    let params = ModelParams { t_a: -0.1, ..Default::default() };
    assert_eq!(transition_table(&params).unwrap_err().kind(), ErrorKind::Configuration);

    let params = ModelParams { n_int_ab: 0, ..Default::default() };
    assert_eq!(transition_table(&params).unwrap_err().kind(), ErrorKind::Configuration);

    let params = ModelParams { coal_abc: f64::INFINITY, ..Default::default() };
    assert_eq!(transition_table(&params).unwrap_err().kind(), ErrorKind::Configuration);
}
