use fieldvm_runtime::Runtime;
use fieldvm_runtime::class_loader::ClassDef;
use fieldvm_runtime::error::RuntimeError;
use fieldvm_runtime::keys::ClassId;
use fieldvm_runtime::vm::Value;
use std::fmt::Display;

const LONG_BEYOND_U32: i64 = 4_294_967_300;

pub struct Fixtures {
    /// `I { int x, y; static int z }`
    pub int_class: ClassId,
    /// `J { long x, y; static long z }`
    pub long_class: ClassId,
}

impl Fixtures {
    pub fn load(runtime: &Runtime) -> Result<Self, RuntimeError> {
        let int_class = runtime.define_and_load(
            ClassDef::new("jvm/PutfieldTest$I")
                .field("x", "I")
                .field("y", "I")
                .static_field("z", "I"),
        )?;
        let long_class = runtime.define_and_load(
            ClassDef::new("jvm/PutfieldTest$J")
                .field("x", "J")
                .field("y", "J")
                .static_field("z", "J"),
        )?;
        Ok(Self {
            int_class,
            long_class,
        })
    }
}

#[derive(Debug)]
pub enum Failure {
    Runtime(RuntimeError),
    Mismatch { expected: Value, actual: Value },
}

impl From<RuntimeError> for Failure {
    fn from(value: RuntimeError) -> Self {
        Failure::Runtime(value)
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Runtime(err) => write!(f, "{err}"),
            Failure::Mismatch { expected, actual } => {
                write!(f, "expected {expected:?}, got {actual:?}")
            }
        }
    }
}

fn assert_value(expected: Value, actual: Value) -> Result<(), Failure> {
    if expected == actual {
        Ok(())
    } else {
        Err(Failure::Mismatch { expected, actual })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Const,
    InstanceField,
    ClassField,
    Local,
}

pub struct Scenario {
    pub name: &'static str,
    shape: Shape,
    long: bool,
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "put_field_const_int",
        shape: Shape::Const,
        long: false,
    },
    Scenario {
        name: "put_field_instance_field_int",
        shape: Shape::InstanceField,
        long: false,
    },
    Scenario {
        name: "put_field_class_field_int",
        shape: Shape::ClassField,
        long: false,
    },
    Scenario {
        name: "put_field_local_int",
        shape: Shape::Local,
        long: false,
    },
    Scenario {
        name: "put_field_const_long",
        shape: Shape::Const,
        long: true,
    },
    Scenario {
        name: "put_field_instance_field_long",
        shape: Shape::InstanceField,
        long: true,
    },
    Scenario {
        name: "put_field_class_field_long",
        shape: Shape::ClassField,
        long: true,
    },
    Scenario {
        name: "put_field_local_long",
        shape: Shape::Local,
        long: true,
    },
];

impl Scenario {
    /// Allocates a fresh object and checks one put/get round trip.
    pub fn run(&self, runtime: &Runtime, fixtures: &Fixtures) -> Result<(), Failure> {
        let (class_id, value) = if self.long {
            (fixtures.long_class, Value::Long(LONG_BEYOND_U32))
        } else {
            (fixtures.int_class, Value::Int(1))
        };
        let obj = runtime.allocate_instance_storage(class_id)?;
        let x = runtime.resolve(class_id, "x")?;
        let access = runtime.access();

        match self.shape {
            Shape::Const => {
                access.put_const(&x, Some(&obj), value)?;
                assert_value(value, access.get_field(&x, Some(&obj))?)
            }
            Shape::InstanceField => {
                let y = runtime.resolve(class_id, "y")?;
                access.put_const(&x, Some(&obj), value)?;
                access.put_field(&y, Some(&obj), &x, Some(&obj))?;
                assert_value(
                    access.get_field(&x, Some(&obj))?,
                    access.get_field(&y, Some(&obj))?,
                )
            }
            Shape::ClassField => {
                let z = runtime.resolve(class_id, "z")?;
                access.put_const(&z, None, value)?;
                access.put_field(&x, Some(&obj), &z, None)?;
                assert_value(access.get_field(&z, None)?, access.get_field(&x, Some(&obj))?)
            }
            Shape::Local => {
                let local = value;
                access.put_local(&x, Some(&obj), local)?;
                assert_value(local, access.get_field(&x, Some(&obj))?)
            }
        }
    }
}
