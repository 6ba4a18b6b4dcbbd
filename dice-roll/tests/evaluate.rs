/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

use dice_roll::{
    evaluate, new_roller_group, parse_notation,
    rng::{self, SequenceSource},
    DiceLimits, Error, EvalContext, Roller,
};
use serial_test::serial;
use std::time::Duration;

struct ResetSource;

impl Drop for ResetSource {
    fn drop(&mut self) {
        rng::reset();
    }
}

fn with_sequence<T>(values: Vec<i64>, f: impl FnOnce() -> T) -> T {
    rng::install(Box::new(SequenceSource::new(values)));
    let _reset = ResetSource;
    f()
}

#[test]
#[serial]
fn floor_of_max() {
    with_sequence(vec![16, 7], || {
        let ctx = EvalContext::new();
        let res = evaluate(&ctx, "floor(max(d20,d12)/2+3)").unwrap();
        assert_eq!(res.rolled, "floor(max((17),(8))/2+3)");
        assert_eq!(res.result, 11.0);
        assert_eq!(res.dice.len(), 2);
        assert_eq!(ctx.rolls(), 2);
    });
}

#[test]
#[serial]
fn size_zero() {
    let ctx = EvalContext::new();
    assert!(matches!(evaluate(&ctx, "d0"), Err(Error::SizeZero)));
    assert!(matches!(evaluate(&ctx, "2d0+1"), Err(Error::SizeZero)));
    assert_eq!(ctx.rolls(), 0);
}

#[test]
#[serial]
fn keep_highest() {
    with_sequence(vec![4, 1, 5, 2], || {
        let ctx = EvalContext::new();
        let group = new_roller_group(&parse_notation("4d6kh1").unwrap()).unwrap();
        group.full_roll(&ctx).unwrap();
        let results: Vec<_> = group.dice().iter().map(|d| d.result()).collect();
        assert_eq!(results, vec![Some(5), Some(2), Some(6), Some(3)]);
        let dropped: Vec<_> = group
            .dice()
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_dropped())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(dropped, vec![0, 1, 3]);
        assert_eq!(group.total(&ctx), Ok(6.0));
    });
}

#[test]
#[serial]
fn rolls_counter_counts_rerolls() {
    with_sequence(vec![0, 3, 0, 0, 5], || {
        let ctx = EvalContext::new();
        let res = evaluate(&ctx, "2d6r1 + d6").unwrap();
        // 1 -> 4, 1 -> 1 -> 6, then 1
        assert_eq!(res.rolled, "(4+6) + (1)");
        assert_eq!(res.result, 11.0);
        assert_eq!(ctx.rolls(), 6);
    });
}

#[test]
#[serial]
fn max_rolls_halts_evaluation() {
    let ctx = EvalContext::new().with_max_rolls(5);
    assert_eq!(
        evaluate(&ctx, "3d6+3d6").map(|r| r.result),
        Err(Error::MaxRollsExceeded(5))
    );
    // the second group does not fit and is never rolled
    assert_eq!(ctx.rolls(), 3);
}

#[test]
#[serial]
fn oversized_group_is_refused_before_building() {
    let ctx = EvalContext::new().with_max_rolls(100);
    assert_eq!(
        evaluate(&ctx, "4000000000d6").map(|r| r.result),
        Err(Error::MaxRollsExceeded(100))
    );
    assert_eq!(ctx.rolls(), 0);
    assert_eq!(
        dice_roll::roll_notation(&ctx, "101d6").map(|g| g.dice().len()),
        Err(Error::MaxRollsExceeded(100))
    );
    assert_eq!(
        dice_roll::roll_notation(&ctx, "100d6").map(|g| g.dice().len()),
        Ok(100)
    );
}

#[test]
#[serial]
fn reroll_limit() {
    let ctx = EvalContext::new();
    assert_eq!(
        evaluate(&ctx, "d1r1").map(|r| r.result),
        Err(Error::RerollLimitExceeded(1000))
    );
    assert_eq!(ctx.rolls(), 1001);
}

#[test]
#[serial]
fn reroll_once_draws_at_most_twice() {
    let ctx = EvalContext::new();
    let res = evaluate(&ctx, "d1ro1").unwrap();
    assert_eq!(res.result, 1.0);
    assert_eq!(ctx.rolls(), 2);
}

#[test]
#[serial]
fn expired_deadline() {
    let ctx = EvalContext::new().with_timeout(Duration::from_secs(0));
    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(
        evaluate(&ctx, "d6").map(|r| r.result),
        Err(Error::Cancelled)
    );
}

#[test]
#[serial]
fn results_stay_in_range() {
    let ctx = EvalContext::new();
    for notation in ["20d6", "20dF", "20d1", "20d100"] {
        let props = parse_notation(notation).unwrap();
        let face = (props.kind, props.size);
        let group = new_roller_group(&props).unwrap();
        group.full_roll(&ctx).unwrap();
        for die in group.dice() {
            let result = die.result().unwrap();
            assert!(
                (face.min()..=face.max()).contains(&result),
                "{} rolled {}",
                notation,
                result
            );
        }
        let total = group.total(&ctx).unwrap() as i64;
        assert!((props.min()..=props.max()).contains(&total));
    }
}

#[test]
#[serial]
fn seeded_evaluations_repeat() {
    let run = || {
        rng::install(Box::new(rng::ChaChaSource::new(7)));
        let res = evaluate(&EvalContext::new(), "10d20kh3 + 4dF").unwrap();
        rng::reset();
        res.rolled
    };
    assert_eq!(run(), run());
}

#[test]
#[serial]
fn variables_and_functions() {
    with_sequence(vec![9], || {
        let ctx = EvalContext::new().with_param("str", 3.0);
        let res = evaluate(&ctx, "d20 + str - min(2, 5)").unwrap();
        assert_eq!(res.rolled, "(10) + str - min(2, 5)");
        assert_eq!(res.result, 11.0);
    });
    let ctx = EvalContext::new();
    assert_eq!(
        evaluate(&ctx, "abs()").map(|r| r.result),
        Err(Error::InvalidArgCount {
            name: "abs",
            got: 0
        })
    );
    assert_eq!(
        evaluate(&ctx, "max()").map(|r| r.result),
        Err(Error::NotEnoughArgs("max"))
    );
    assert_eq!(
        evaluate(&ctx, "wis").map(|r| r.result),
        Err(Error::UnknownVariable("wis".to_string()))
    );
}

#[test]
#[serial]
fn json_shape() {
    with_sequence(vec![4, 1], || {
        let ctx = EvalContext::new();
        let res = evaluate(&ctx, "2d6kh1+1").unwrap();
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "original": "2d6kh1+1",
                "rolled": "(5)+1",
                "result": 6.0,
                "dice": [{
                    "group": [
                        {"type": "polyhedron", "size": 6, "result": 5},
                        {"type": "polyhedron", "size": 6, "result": 2, "dropped": true}
                    ],
                    "modifiers": [{"type": "drop_keep", "method": "kh", "num": 1}]
                }]
            })
        );
    });
}

#[test]
fn properties_json_shape() {
    let props = parse_notation("3d6r<2").unwrap();
    assert_eq!(
        serde_json::to_value(&props).unwrap(),
        serde_json::json!({
            "kind": "polyhedron",
            "size": 6,
            "count": 3,
            "die_modifiers": [{"type": "reroll", "compare": "<", "target": 2, "once": false}],
            "group_modifiers": []
        })
    );
}
