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

use crate::dice_types::*;

/// Smallest and largest value something built from dice can come out as.
pub trait DiceLimits {
    fn min(&self) -> i64;
    fn max(&self) -> i64;
}

/// A single face of a die of `kind` with `size` sides.
impl DiceLimits for (DieKind, u32) {
    fn min(&self) -> i64 {
        match self.0 {
            DieKind::Polyhedron => 1,
            DieKind::Fudge => -1,
        }
    }

    fn max(&self) -> i64 {
        match self.0 {
            DieKind::Polyhedron => i64::from(self.1),
            DieKind::Fudge => 1,
        }
    }
}

impl RollerProperties {
    fn may_drop(&self) -> bool {
        self.group_modifiers
            .iter()
            .any(|m| matches!(m, Modifier::DropKeep { .. }))
    }
}

/// The total of the whole group. Dropped dice count as 0.
impl DiceLimits for RollerProperties {
    fn min(&self) -> i64 {
        let all = i64::from(self.count).saturating_mul((self.kind, self.size).min());
        if self.may_drop() {
            all.min(0)
        } else {
            all
        }
    }

    fn max(&self) -> i64 {
        let all = i64::from(self.count).saturating_mul((self.kind, self.size).max());
        if self.may_drop() {
            all.max(0)
        } else {
            all
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_limits() {
        assert_eq!((DieKind::Polyhedron, 20).min(), 1);
        assert_eq!((DieKind::Polyhedron, 20).max(), 20);
        assert_eq!((DieKind::Fudge, 1).min(), -1);
        assert_eq!((DieKind::Fudge, 1).max(), 1);
    }

    #[test]
    fn test_group_limits() {
        let mut props = RollerProperties::new(DieKind::Polyhedron, 6, 3);
        assert_eq!((props.min(), props.max()), (3, 18));
        props.add_modifier(Modifier::DropKeep {
            method: DropKeepMethod::KeepHighest,
            num: 1,
        });
        assert_eq!((props.min(), props.max()), (0, 18));

        let fudge = RollerProperties::new(DieKind::Fudge, 1, 4);
        assert_eq!((fudge.min(), fudge.max()), (-4, 4));

        let huge = RollerProperties::new(DieKind::Polyhedron, u32::MAX, u32::MAX);
        assert_eq!(huge.min(), i64::from(u32::MAX));
        assert_eq!(huge.max(), i64::MAX);
        let huge_fudge = RollerProperties::new(DieKind::Fudge, 1, u32::MAX);
        assert_eq!(
            (huge_fudge.min(), huge_fudge.max()),
            (-i64::from(u32::MAX), i64::from(u32::MAX))
        );
    }
}
