#![cfg(test)]

// Property tests for List kept inside the crate so they can observe the
// descriptor's free calls through a counting ValueType.

use crate::list::{List, ListError};
use crate::value_type::ValueType;
use proptest::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

// Counts every free so teardown and removal can be checked against a model.
#[derive(Clone)]
struct Counting {
    frees: Rc<Cell<usize>>,
}

impl ValueType for Counting {
    type Source = i32;
    type Elem = i32;

    fn copy(&self, src: &i32) -> i32 {
        *src
    }

    fn free(&self, _value: i32) {
        self.frees.set(self.frees.get() + 1);
    }
}

#[derive(Clone, Debug)]
enum Op {
    PushBack(i32),
    PushFront(i32),
    Insert(usize, i32),
    Pop(usize),
    Remove(usize),
    Get(usize),
    ExtendFront(Vec<i32>),
    PopRange(usize, usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::PushBack),
        any::<i32>().prop_map(Op::PushFront),
        (0usize..12, any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        (0usize..12).prop_map(Op::Pop),
        (0usize..12).prop_map(Op::Remove),
        (0usize..12).prop_map(Op::Get),
        proptest::collection::vec(any::<i32>(), 0..4).prop_map(Op::ExtendFront),
        (0usize..12, 0usize..12).prop_map(|(a, b)| Op::PopRange(a, b)),
    ]
}

fn expected_error(model: &[i32], index: usize) -> Option<ListError> {
    if model.is_empty() {
        Some(ListError::IndexError)
    } else if index >= model.len() {
        Some(ListError::OutOfRange {
            index,
            len: model.len(),
        })
    } else {
        None
    }
}

// Property: state-machine equivalence against Vec<i32>.
// Invariants exercised across random operation sequences:
// - `len` equals the model length after every operation.
// - Positional reads agree with the model at every index, forward and back.
// - Empty-list access fails with IndexError; index >= len fails with OutOfRange.
// - `free` runs once per Remove/PopRange-free and once per survivor on drop.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_list_matches_vec_model(ops in proptest::collection::vec(arb_op(), 1..80)) {
        let frees = Rc::new(Cell::new(0));
        let mut sut = List::new(Counting { frees: frees.clone() });
        let mut model: Vec<i32> = Vec::new();
        let mut expected_frees = 0usize;

        for op in ops {
            match op {
                Op::PushBack(v) => {
                    sut.push_back(&v);
                    model.push(v);
                }
                Op::PushFront(v) => {
                    sut.push_front(&v);
                    model.insert(0, v);
                }
                Op::Insert(i, v) => match expected_error(&model, i) {
                    Some(e) => prop_assert_eq!(sut.insert(i, &v), Err(e)),
                    None => {
                        prop_assert_eq!(sut.insert(i, &v), Ok(()));
                        model.insert(i, v);
                    }
                },
                Op::Pop(i) => match expected_error(&model, i) {
                    Some(e) => prop_assert_eq!(sut.pop(i), Err(e)),
                    None => prop_assert_eq!(sut.pop(i), Ok(model.remove(i))),
                },
                Op::Remove(i) => match expected_error(&model, i) {
                    Some(e) => prop_assert_eq!(sut.remove(i), Err(e)),
                    None => {
                        prop_assert_eq!(sut.remove(i), Ok(()));
                        model.remove(i);
                        expected_frees += 1;
                    }
                },
                Op::Get(i) => match expected_error(&model, i) {
                    Some(e) => prop_assert_eq!(sut.get(i), Err(e)),
                    None => prop_assert_eq!(sut.get(i), Ok(&model[i])),
                },
                Op::ExtendFront(vs) => {
                    sut.extend_front(&vs);
                    model.splice(0..0, vs.iter().copied());
                }
                Op::PopRange(a, b) => {
                    let res = sut.pop_range(a..b);
                    if model.is_empty() || a > b {
                        prop_assert_eq!(res, Err(ListError::IndexError));
                    } else if b > model.len() {
                        prop_assert_eq!(res, Err(ListError::OutOfRange { index: b, len: model.len() }));
                    } else {
                        let popped: Vec<i32> = model.drain(a..b).collect();
                        prop_assert_eq!(res, Ok(popped));
                    }
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            let forward: Vec<i32> = sut.iter().copied().collect();
            prop_assert_eq!(&forward, &model);
            let backward: Vec<i32> = sut.iter().rev().copied().collect();
            let mut reversed = model.clone();
            reversed.reverse();
            prop_assert_eq!(backward, reversed);
            prop_assert_eq!(frees.get(), expected_frees);
        }

        // Teardown frees every survivor exactly once.
        drop(sut);
        prop_assert_eq!(frees.get(), expected_frees + model.len());
    }
}

// Property: pushing n values and popping from the front yields insertion
// order for push_back and reverse order for push_front.
proptest! {
    #[test]
    fn prop_push_pop_round_trip(values in proptest::collection::vec(any::<i32>(), 0..40)) {
        let frees = Rc::new(Cell::new(0));
        let mut back = List::new(Counting { frees: frees.clone() });
        let mut front = List::new(Counting { frees: frees.clone() });
        for v in &values {
            back.push_back(v);
            front.push_front(v);
        }

        let mut from_back = Vec::new();
        while let Ok(v) = back.pop(0) {
            from_back.push(v);
        }
        let mut from_front = Vec::new();
        while let Ok(v) = front.pop(0) {
            from_front.push(v);
        }

        prop_assert_eq!(&from_back, &values);
        let mut reversed = values.clone();
        reversed.reverse();
        prop_assert_eq!(from_front, reversed);
        // Popped values are detached, never freed by the list.
        drop(back);
        drop(front);
        prop_assert_eq!(frees.get(), 0);
    }
}
