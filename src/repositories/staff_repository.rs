use crate::entities::staff;
use crate::repositories::crud_repository;

crud_repository!(StaffRepository, staff);
