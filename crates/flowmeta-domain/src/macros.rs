/// Implementa `Entity` para un struct con campo `header` cuyo nombre coincide
/// con la variante de `EntityKind` y de `AnyEntity`.
macro_rules! entity_impl {
    ($ty:ident, |$e:ident| $key:expr) => {
        impl $crate::Entity for $ty {
            const KIND: $crate::EntityKind = $crate::EntityKind::$ty;

            fn header(&self) -> &$crate::EntityHeader {
                &self.header
            }

            fn header_mut(&mut self) -> &mut $crate::EntityHeader {
                &mut self.header
            }

            fn composite_key(&self) -> $crate::CompositeKey {
                let $e = self;
                $key
            }

            fn into_any(self) -> $crate::AnyEntity {
                $crate::AnyEntity::$ty(self)
            }

            fn from_any(any: $crate::AnyEntity) -> Option<Self> {
                match any {
                    $crate::AnyEntity::$ty(e) => Some(e),
                    _ => None,
                }
            }
        }
    };
}
