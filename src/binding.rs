//! Conversions between the two calling shapes used around the wrapper.
//!
//! A *plugin* takes its receiver plus the whole argument list as a slice:
//! `FnMut(&mut T, &[A]) -> R`. A *plain* function takes the receiver plus
//! individual positional arguments: `FnMut(&mut T, P) -> R`, where `P` is a
//! tuple of `A`s (or a `Vec<A>` to take everything). [`bind`] and [`unbind`]
//! convert between the two; [`curry`] freezes a plugin's arguments.

use std::rc::Rc;

/// A plugin behind a box, as produced by [`curry`].
pub type BoxedPlugin<'a, T, A, R> = Box<dyn FnMut(&mut T, &[A]) -> R + 'a>;

/// Positional arguments that can be spread out of, and collected into, an
/// argument list.
///
/// Spreading is lenient: a missing position becomes `A::default()` and
/// surplus arguments are dropped.
pub trait Positional<A>: Sized {
    fn from_args(args: &[A]) -> Self;
    fn into_args(self) -> Vec<A>;
}

impl<A> Positional<A> for () {
    fn from_args(_args: &[A]) -> Self {}

    fn into_args(self) -> Vec<A> {
        Vec::new()
    }
}

impl<A: Clone> Positional<A> for Vec<A> {
    fn from_args(args: &[A]) -> Self {
        args.to_vec()
    }

    fn into_args(self) -> Vec<A> {
        self
    }
}

macro_rules! positional_tuple {
    ($($idx:tt : $ty:ident),+) => {
        impl<A: Clone + Default> Positional<A> for ($($ty,)+) {
            fn from_args(args: &[A]) -> Self {
                ($(args.get($idx).cloned().unwrap_or_default(),)+)
            }

            fn into_args(self) -> Vec<A> {
                vec![$(self.$idx),+]
            }
        }
    };
}

positional_tuple!(0: A);
positional_tuple!(0: A, 1: A);
positional_tuple!(0: A, 1: A, 2: A);
positional_tuple!(0: A, 1: A, 2: A, 3: A);

/// Turn a plugin into a plain function taking positional arguments.
pub fn unbind<T, A, P, R, F>(mut plugin: F) -> impl FnMut(&mut T, P) -> R
where
    F: FnMut(&mut T, &[A]) -> R,
    P: Positional<A>,
{
    move |this, positional| plugin(this, &positional.into_args())
}

/// Turn a plain function taking positional arguments into a plugin.
pub fn bind<T, A, P, R, F>(mut plain: F) -> impl FnMut(&mut T, &[A]) -> R
where
    F: FnMut(&mut T, P) -> R,
    P: Positional<A>,
{
    move |this, args| plain(this, P::from_args(args))
}

/// Build a factory of plugins with frozen arguments.
///
/// Each plugin the factory returns ignores the arguments it is invoked with
/// and calls `plugin` with the fixed set instead, on its own receiver.
pub fn curry<'a, T, A, R, F>(plugin: F) -> impl Fn(Vec<A>) -> BoxedPlugin<'a, T, A, R>
where
    F: Fn(&mut T, &[A]) -> R + 'a,
    T: 'a,
    A: 'a,
    R: 'a,
{
    let plugin = Rc::new(plugin);
    move |fixed: Vec<A>| {
        let plugin = Rc::clone(&plugin);
        Box::new(move |this: &mut T, _args: &[A]| (*plugin)(this, &fixed)) as BoxedPlugin<'a, T, A, R>
    }
}
