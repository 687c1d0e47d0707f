/// Forwards arithmetic on a single-field newtype to the wrapped value.
///
/// Groups are separated by `;`: binary operators, then compound assignment, then unary operators.
///
/// ```ignore
/// newtype_ops!(MinorUnits; Add::add, Sub::sub; AddAssign::add_assign; Neg::neg);
/// ```
#[macro_export]
macro_rules! newtype_ops {
    (
        $newtype:ident;
        $($bin_trait:ident::$bin_fn:ident),*;
        $($assign_trait:ident::$assign_fn:ident),*;
        $($unary_trait:ident::$unary_fn:ident),*
    ) => {
        $(
            impl core::ops::$bin_trait for $newtype {
                type Output = $newtype;

                fn $bin_fn(self, other: $newtype) -> $newtype {
                    $newtype(core::ops::$bin_trait::$bin_fn(self.0, other.0))
                }
            }
        )*
        $(
            impl core::ops::$assign_trait for $newtype {
                fn $assign_fn(&mut self, other: $newtype) {
                    core::ops::$assign_trait::$assign_fn(&mut self.0, other.0);
                }
            }
        )*
        $(
            impl core::ops::$unary_trait for $newtype {
                type Output = $newtype;

                fn $unary_fn(self) -> $newtype {
                    $newtype(core::ops::$unary_trait::$unary_fn(self.0))
                }
            }
        )*
    };
}
