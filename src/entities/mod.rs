//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod allocation;
pub mod attendance;
pub mod session;
pub mod student;
pub mod subject;
pub mod teacher;

// Re-export specific types to avoid conflicts
pub use allocation::{
    Column as AllocationColumn, Entity as Allocation, Model as AllocationModel,
};
pub use attendance::{
    AttendanceStatus, Column as AttendanceColumn, Entity as Attendance,
    Model as AttendanceModel,
};
pub use session::{Column as SessionColumn, Entity as Session, Model as SessionModel, Role};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use subject::{Column as SubjectColumn, Entity as Subject, Model as SubjectModel};
pub use teacher::{Column as TeacherColumn, Entity as Teacher, Model as TeacherModel};
