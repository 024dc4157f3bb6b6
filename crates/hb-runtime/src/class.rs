use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use hb_core::{coerce, Args, BridgeError, HostError, MarshalError, ParamKind, Value};

type MethodAdapter = Rc<dyn Fn(&dyn Any, Args) -> Result<HostValue, HostError>>;
type FieldAdapter = Rc<dyn Fn(&dyn Any) -> Result<Value, HostError>>;
type Describe = fn(&mut ClassRegistry) -> Rc<MethodTable>;

/// A host type whose methods script code may call by name.
///
/// `describe` runs once per type; the resulting [`MethodTable`] is cached in a
/// [`ClassRegistry`] and shared by every handle of that type.
pub trait HostClass: Sized + 'static {
    const NAME: &'static str;

    fn describe(class: &mut ClassBuilder<Self>);
}

#[derive(Clone)]
pub struct MethodDesc {
    name: String,
    params: Vec<ParamKind>,
    rest: Option<ParamKind>,
    call: MethodAdapter,
}

impl MethodDesc {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub fn accepts(&self, arity: usize) -> bool {
        match self.rest {
            None => arity == self.params.len(),
            Some(_) => arity >= self.params.len(),
        }
    }

    /// Coerces positional values to the declared kinds; surplus values of a
    /// variadic method are packed into one trailing list.
    pub fn bind_args(&self, values: Vec<Value>) -> Result<Args, MarshalError> {
        let mut values = values.into_iter();
        let mut bound = Vec::with_capacity(self.params.len() + 1);
        for (index, kind) in self.params.iter().enumerate() {
            let value = values
                .next()
                .ok_or(MarshalError::MissingArgument { index })?;
            bound.push(coerce(value, *kind)?);
        }
        if let Some(kind) = self.rest {
            let rest = values
                .map(|value| coerce(value, kind))
                .collect::<Result<Vec<_>, _>>()?;
            bound.push(Value::List(rest));
        }
        Ok(Args::new(bound))
    }
}

impl fmt::Debug for MethodDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDesc")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("rest", &self.rest)
            .finish_non_exhaustive()
    }
}

pub struct MethodTable {
    name: &'static str,
    methods: Vec<MethodDesc>,
    fields: Vec<(String, FieldAdapter)>,
}

impl MethodTable {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn methods(&self) -> &[MethodDesc] {
        &self.methods
    }

    /// First declared method with a matching name and compatible arity.
    pub fn resolve(&self, method: &str, arity: usize) -> Option<&MethodDesc> {
        self.methods
            .iter()
            .find(|candidate| candidate.name == method && candidate.accepts(arity))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Every arity under which script code can reach each method name.
    /// Variadic methods are expanded up to `max_arity`.
    pub fn script_arities(&self, max_arity: usize) -> BTreeMap<String, BTreeSet<usize>> {
        let mut out: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        for method in &self.methods {
            let arities = out.entry(method.name.clone()).or_default();
            match method.rest {
                None => {
                    arities.insert(method.params.len());
                }
                Some(_) => arities.extend(method.params.len()..=max_arity.max(method.params.len())),
            }
        }
        out
    }

    /// Runs the first matching method. A panicking adapter is reported as an
    /// invocation failure; the receiver stays usable afterwards.
    pub(crate) fn call(
        &self,
        object: &dyn Any,
        method: &str,
        values: Vec<Value>,
    ) -> Result<HostValue, BridgeError> {
        let desc = self
            .resolve(method, values.len())
            .ok_or_else(|| BridgeError::MethodNotFound {
                class: self.name.to_string(),
                method: method.to_string(),
                arity: values.len(),
            })?;
        let args = desc.bind_args(values)?;
        panic::catch_unwind(AssertUnwindSafe(|| (desc.call)(object, args)))
            .unwrap_or_else(|payload| Err(HostError::failed(panic_message(payload.as_ref()))))
            .map_err(|error| self.host_failure(method, error))
    }

    pub(crate) fn read_field(&self, object: &dyn Any, field: &str) -> Result<Value, BridgeError> {
        let (_, get) = self
            .fields
            .iter()
            .find(|(name, _)| name == field)
            .ok_or_else(|| BridgeError::MethodNotFound {
                class: self.name.to_string(),
                method: field.to_string(),
                arity: 0,
            })?;
        panic::catch_unwind(AssertUnwindSafe(|| get(object)))
            .unwrap_or_else(|payload| Err(HostError::failed(panic_message(payload.as_ref()))))
            .map_err(|error| self.host_failure(field, error))
    }

    fn host_failure(&self, method: &str, error: HostError) -> BridgeError {
        match error {
            HostError::Marshal(error) => BridgeError::Marshal(error),
            HostError::Bridge(error) => error,
            HostError::Failed(message) => BridgeError::Invocation {
                class: self.name.to_string(),
                method: method.to_string(),
                message,
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("name", &self.name)
            .field("methods", &self.methods)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .finish()
    }
}

pub struct ClassBuilder<T> {
    methods: Vec<MethodDesc>,
    fields: Vec<(String, FieldAdapter)>,
    related: Vec<Describe>,
    _class: PhantomData<fn(T)>,
}

impl<T: HostClass> ClassBuilder<T> {
    fn new() -> Self {
        Self {
            methods: Vec::new(),
            fields: Vec::new(),
            related: Vec::new(),
            _class: PhantomData,
        }
    }

    /// Declares a method. It may return a plain [`Value`] or a [`HostRef`];
    /// the latter reaches script code as a fresh handle.
    pub fn method<F, R>(&mut self, name: &str, params: &[ParamKind], call: F) -> &mut Self
    where
        F: Fn(&mut T, Args) -> Result<R, HostError> + 'static,
        R: Into<HostValue>,
    {
        self.push(name, params, None, call)
    }

    /// A method whose trailing arguments, however many, arrive as one list.
    pub fn variadic<F, R>(
        &mut self,
        name: &str,
        params: &[ParamKind],
        rest: ParamKind,
        call: F,
    ) -> &mut Self
    where
        F: Fn(&mut T, Args) -> Result<R, HostError> + 'static,
        R: Into<HostValue>,
    {
        self.push(name, params, Some(rest), call)
    }

    pub fn field<F>(&mut self, name: &str, get: F) -> &mut Self
    where
        F: Fn(&T) -> Value + 'static,
    {
        let adapter: FieldAdapter = Rc::new(move |object: &dyn Any| {
            let this = borrow_receiver::<T>(object)?;
            Ok(get(&this))
        });
        self.fields.push((name.to_string(), adapter));
        self
    }

    /// Declares a class whose objects this one's methods hand out. Its methods
    /// become callable with dot syntax from the first evaluation that sees
    /// this class, not only from later ones.
    pub fn returns<C: HostClass>(&mut self) -> &mut Self {
        self.related.push(ClassRegistry::table_for::<C>);
        self
    }

    fn push<F, R>(
        &mut self,
        name: &str,
        params: &[ParamKind],
        rest: Option<ParamKind>,
        call: F,
    ) -> &mut Self
    where
        F: Fn(&mut T, Args) -> Result<R, HostError> + 'static,
        R: Into<HostValue>,
    {
        let adapter: MethodAdapter = Rc::new(move |object: &dyn Any, args: Args| {
            let mut this = borrow_receiver_mut::<T>(object)?;
            call(&mut this, args).map(Into::into)
        });
        self.methods.push(MethodDesc {
            name: name.to_string(),
            params: params.to_vec(),
            rest,
            call: adapter,
        });
        self
    }

    fn build(self) -> (MethodTable, Vec<Describe>) {
        let table = MethodTable {
            name: T::NAME,
            methods: self.methods,
            fields: self.fields,
        };
        (table, self.related)
    }
}

fn downcast_receiver<T: HostClass>(object: &dyn Any) -> Result<&RefCell<T>, HostError> {
    object
        .downcast_ref::<RefCell<T>>()
        .ok_or_else(|| HostError::failed(format!("receiver is not a {}", T::NAME)))
}

fn borrow_receiver<T: HostClass>(object: &dyn Any) -> Result<Ref<'_, T>, HostError> {
    downcast_receiver::<T>(object)?
        .try_borrow()
        .map_err(|_| HostError::failed(format!("{} is busy in another call", T::NAME)))
}

fn borrow_receiver_mut<T: HostClass>(object: &dyn Any) -> Result<RefMut<'_, T>, HostError> {
    downcast_receiver::<T>(object)?
        .try_borrow_mut()
        .map_err(|_| HostError::failed(format!("{} is busy in another call", T::NAME)))
}

/// Method tables keyed by host type, built on first use.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    tables: HashMap<TypeId, Rc<MethodTable>>,
}

impl ClassRegistry {
    /// Builds `T`'s table on first use, then any classes it declared with
    /// [`ClassBuilder::returns`].
    pub fn table_for<T: HostClass>(&mut self) -> Rc<MethodTable> {
        if let Some(table) = self.tables.get(&TypeId::of::<T>()) {
            return Rc::clone(table);
        }
        let mut builder = ClassBuilder::<T>::new();
        T::describe(&mut builder);
        let (table, related) = builder.build();
        let table = Rc::new(table);
        self.tables.insert(TypeId::of::<T>(), Rc::clone(&table));
        for describe in related {
            describe(self);
        }
        table
    }

    pub fn tables(&self) -> impl Iterator<Item = &Rc<MethodTable>> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// A host object the host hands to the bridge, erased to its method table.
#[derive(Clone)]
pub struct HostRef {
    object: Rc<dyn Any>,
    class_name: &'static str,
    describe: Describe,
}

impl HostRef {
    pub fn new<T: HostClass>(object: Rc<RefCell<T>>) -> Self {
        Self {
            object,
            class_name: T::NAME,
            describe: ClassRegistry::table_for::<T>,
        }
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub(crate) fn object(&self) -> Rc<dyn Any> {
        Rc::clone(&self.object)
    }

    pub(crate) fn table(&self, registry: &mut ClassRegistry) -> Rc<MethodTable> {
        (self.describe)(registry)
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRef")
            .field("class_name", &self.class_name)
            .finish_non_exhaustive()
    }
}

/// What a host method hands back, or what a host binds into a program:
/// either plain data or a host object that script code receives as a handle.
#[derive(Debug, Clone)]
pub enum HostValue {
    Value(Value),
    Ref(HostRef),
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<HostRef> for HostValue {
    fn from(object: HostRef) -> Self {
        Self::Ref(object)
    }
}

impl<T: HostClass> From<Rc<RefCell<T>>> for HostValue {
    fn from(object: Rc<RefCell<T>>) -> Self {
        Self::Ref(HostRef::new(object))
    }
}
